//! Shared session state and configuration.
//!
//! [`SessionStore`] is the single shared mutable resource of the sync core:
//! an explicit, shared-ownership state object with per-key change
//! notification. Every component reads and writes through it; there is no
//! ambient or singleton state.
//!
//! # Concurrency design
//!
//! Each key is backed by its own `tokio::sync::watch` channel, so a `set` is
//! write-then-notify in one step: subscribers woken by a change always
//! observe the committed value, never a stale intermediate. Protocol logic
//! runs on a single pump task, so multi-key updates (such as the room reset)
//! contain no await points and are observed by other tasks as one
//! transition.
//!
//! # Change origins
//!
//! Every mutation carries a [`ChangeOrigin`] tag. The broadcast policy only
//! propagates [`ChangeOrigin::LocalUser`] writes, which is what prevents a
//! remote-applied state change from echoing back into the room.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{SyncError, SyncResult};
use crate::protocol_constants::{
    DRIFT_TOLERANCE_SECS, EVENT_CHANNEL_CAPACITY, PLAYER_EVENT_CHANNEL_CAPACITY,
};
use crate::transport::{ConnectionState, PeerId};

/// Playback state of the shared video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoState {
    /// Playback halted.
    #[default]
    Paused,
    /// Playback running.
    Playing,
}

/// Who caused a state mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A local user action or local player report. Eligible for broadcast.
    LocalUser,
    /// Applied from a decoded remote message. Never rebroadcast.
    Remote,
    /// Session lifecycle bookkeeping (roster updates, resets). Never
    /// broadcast.
    Lifecycle,
}

/// A value together with the origin of the write that produced it.
#[derive(Debug, Clone)]
pub struct Tagged<T> {
    /// The committed value.
    pub value: T,
    /// Origin of the write.
    pub origin: ChangeOrigin,
}

/// One roster or playback notice in the room's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    /// Peer the notice is about or from.
    pub author: PeerId,
    /// Notice text.
    pub text: String,
}

/// Point-in-time copy of the full session state, for UI consumption.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Whether the local peer holds the host role.
    pub is_hosting: bool,
    /// Active room identifier, if any.
    pub room_id: Option<String>,
    /// Transport-assigned local peer id, if assigned.
    pub local_peer_id: Option<PeerId>,
    /// Connection state of the active group session.
    pub connection_state: ConnectionState,
    /// Sorted, deduplicated roster.
    pub members: Vec<PeerId>,
    /// Most recently joined peer, if any.
    pub latest_member: Option<PeerId>,
    /// Currently loaded video, if any.
    pub video_id: Option<String>,
    /// Shared playback state.
    pub video_state: VideoState,
    /// Shared playback position (seconds).
    pub video_time: f64,
    /// Room activity feed.
    pub chat: Vec<ChatEntry>,
}

/// One observable key: a watch channel whose value carries its write origin.
struct Slot<T> {
    tx: watch::Sender<Tagged<T>>,
}

impl<T: Clone> Slot<T> {
    fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Tagged {
            value: initial,
            origin: ChangeOrigin::Lifecycle,
        });
        Self { tx }
    }

    fn get(&self) -> T {
        self.tx.borrow().value.clone()
    }

    fn set(&self, value: T, origin: ChangeOrigin) {
        self.tx.send_replace(Tagged { value, origin });
    }

    fn watch(&self) -> watch::Receiver<Tagged<T>> {
        self.tx.subscribe()
    }
}

/// The shared observable session state.
///
/// Subscriptions are lazy sequences of committed changes: a
/// [`watch::Receiver`] yields each change at most once and cannot be
/// restarted once dropped (call the corresponding `watch_*` again for a
/// fresh subscription). Wrap a receiver in
/// `tokio_stream::wrappers::WatchStream::from_changes` to consume it as a
/// `Stream`.
pub struct SessionStore {
    is_hosting: Slot<bool>,
    room_id: Slot<Option<String>>,
    local_peer_id: Slot<Option<PeerId>>,
    connection_state: Slot<ConnectionState>,
    members: Slot<Vec<PeerId>>,
    latest_member: Slot<Option<PeerId>>,
    video_id: Slot<Option<String>>,
    video_state: Slot<VideoState>,
    video_time: Slot<f64>,
    chat: Slot<Vec<ChatEntry>>,
}

impl SessionStore {
    /// Creates a store with every key at its empty default.
    pub fn new() -> Self {
        Self {
            is_hosting: Slot::new(false),
            room_id: Slot::new(None),
            local_peer_id: Slot::new(None),
            connection_state: Slot::new(ConnectionState::Disconnected),
            members: Slot::new(Vec::new()),
            latest_member: Slot::new(None),
            video_id: Slot::new(None),
            video_state: Slot::new(VideoState::Paused),
            video_time: Slot::new(0.0),
            chat: Slot::new(Vec::new()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Getters
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the local peer holds the host role.
    pub fn is_hosting(&self) -> bool {
        self.is_hosting.get()
    }

    /// Active room identifier, if any.
    pub fn room_id(&self) -> Option<String> {
        self.room_id.get()
    }

    /// Transport-assigned local peer id, if assigned.
    pub fn local_peer_id(&self) -> Option<PeerId> {
        self.local_peer_id.get()
    }

    /// Connection state of the active group session.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state.get()
    }

    /// Sorted, deduplicated roster.
    pub fn members(&self) -> Vec<PeerId> {
        self.members.get()
    }

    /// Most recently joined peer, if any.
    pub fn latest_member(&self) -> Option<PeerId> {
        self.latest_member.get()
    }

    /// Currently loaded video, if any.
    pub fn video_id(&self) -> Option<String> {
        self.video_id.get()
    }

    /// Shared playback state.
    pub fn video_state(&self) -> VideoState {
        self.video_state.get()
    }

    /// Shared playback position (seconds).
    pub fn video_time(&self) -> f64 {
        self.video_time.get()
    }

    /// Room activity feed.
    pub fn chat(&self) -> Vec<ChatEntry> {
        self.chat.get()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Setters (write-then-notify)
    // ─────────────────────────────────────────────────────────────────────────

    /// Sets the host flag.
    pub fn set_is_hosting(&self, value: bool, origin: ChangeOrigin) {
        self.is_hosting.set(value, origin);
    }

    /// Sets the room id. A change here drives the room session lifecycle.
    pub fn set_room_id(&self, value: Option<String>, origin: ChangeOrigin) {
        self.room_id.set(value, origin);
    }

    /// Records the transport-assigned local peer id.
    pub fn set_local_peer_id(&self, value: Option<PeerId>, origin: ChangeOrigin) {
        self.local_peer_id.set(value, origin);
    }

    /// Records the session connection state.
    pub fn set_connection_state(&self, value: ConnectionState, origin: ChangeOrigin) {
        self.connection_state.set(value, origin);
    }

    /// Replaces the roster.
    pub fn set_members(&self, value: Vec<PeerId>, origin: ChangeOrigin) {
        self.members.set(value, origin);
    }

    /// Records the most recently joined peer.
    pub fn set_latest_member(&self, value: Option<PeerId>, origin: ChangeOrigin) {
        self.latest_member.set(value, origin);
    }

    /// Sets the loaded video.
    pub fn set_video_id(&self, value: Option<String>, origin: ChangeOrigin) {
        self.video_id.set(value, origin);
    }

    /// Sets the playback state.
    pub fn set_video_state(&self, value: VideoState, origin: ChangeOrigin) {
        self.video_state.set(value, origin);
    }

    /// Sets the playback position (seconds).
    pub fn set_video_time(&self, value: f64, origin: ChangeOrigin) {
        self.video_time.set(value, origin);
    }

    /// Appends a notice to the activity feed.
    pub fn append_chat(&self, author: PeerId, text: impl Into<String>) {
        let mut chat = self.chat.get();
        chat.push(ChatEntry {
            author,
            text: text.into(),
        });
        self.chat.set(chat, ChangeOrigin::Lifecycle);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    /// Subscribes to room id changes.
    pub fn watch_room_id(&self) -> watch::Receiver<Tagged<Option<String>>> {
        self.room_id.watch()
    }

    /// Subscribes to host flag changes.
    pub fn watch_is_hosting(&self) -> watch::Receiver<Tagged<bool>> {
        self.is_hosting.watch()
    }

    /// Subscribes to roster changes.
    pub fn watch_members(&self) -> watch::Receiver<Tagged<Vec<PeerId>>> {
        self.members.watch()
    }

    /// Subscribes to video id changes.
    pub fn watch_video_id(&self) -> watch::Receiver<Tagged<Option<String>>> {
        self.video_id.watch()
    }

    /// Subscribes to playback state changes.
    pub fn watch_video_state(&self) -> watch::Receiver<Tagged<VideoState>> {
        self.video_state.watch()
    }

    /// Subscribes to playback position changes.
    pub fn watch_video_time(&self) -> watch::Receiver<Tagged<f64>> {
        self.video_time.watch()
    }

    /// Subscribes to connection state changes.
    pub fn watch_connection_state(&self) -> watch::Receiver<Tagged<ConnectionState>> {
        self.connection_state.watch()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Resets every room-derived key to its empty default.
    ///
    /// Called when `room_id` transitions to `None`. The local peer id and
    /// connection state are transport-owned and not part of the reset. No
    /// await points: other tasks observe the reset as a single transition.
    pub fn reset_room_state(&self) {
        self.is_hosting.set(false, ChangeOrigin::Lifecycle);
        self.members.set(Vec::new(), ChangeOrigin::Lifecycle);
        self.latest_member.set(None, ChangeOrigin::Lifecycle);
        self.video_id.set(None, ChangeOrigin::Lifecycle);
        self.video_state.set(VideoState::Paused, ChangeOrigin::Lifecycle);
        self.video_time.set(0.0, ChangeOrigin::Lifecycle);
        self.chat.set(Vec::new(), ChangeOrigin::Lifecycle);
    }

    /// Point-in-time copy of the full state.
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            is_hosting: self.is_hosting.get(),
            room_id: self.room_id.get(),
            local_peer_id: self.local_peer_id.get(),
            connection_state: self.connection_state.get(),
            members: self.members.get(),
            latest_member: self.latest_member.get(),
            video_id: self.video_id.get(),
            video_state: self.video_state.get(),
            video_time: self.video_time.get(),
            chat: self.chat.get(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the sync core.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Drift-correction tolerance (seconds). Exclusive threshold: a
    /// deviation of exactly this value does not seek.
    pub drift_tolerance_secs: f64,

    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,

    /// Capacity of the player event channel.
    pub player_event_channel_capacity: usize,
}

impl Config {
    /// Creates a new `Config` with validated values.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] if any value would cause runtime
    /// issues.
    pub fn new(
        drift_tolerance_secs: f64,
        event_channel_capacity: usize,
        player_event_channel_capacity: usize,
    ) -> SyncResult<Self> {
        let config = Self {
            drift_tolerance_secs,
            event_channel_capacity,
            player_event_channel_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> SyncResult<()> {
        if !self.drift_tolerance_secs.is_finite() || self.drift_tolerance_secs <= 0.0 {
            return Err(SyncError::InvalidConfig(
                "drift_tolerance_secs must be finite and > 0".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "event_channel_capacity must be >= 1 (broadcast::channel panics on 0)".to_string(),
            ));
        }
        if self.player_event_channel_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "player_event_channel_capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drift_tolerance_secs: DRIFT_TOLERANCE_SECS,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            player_event_channel_capacity: PLAYER_EVENT_CHANNEL_CAPACITY,
        }
    }
}
