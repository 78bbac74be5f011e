//! Room session lifecycle management.
//!
//! Responsibilities:
//! - Watching `room_id` changes on the session store
//! - Creating one group session per room (never two concurrently)
//! - Ordered teardown: cancel the sync pump, then leave the transport group
//! - Resetting session state to empty defaults on leave
//!
//! There is no host failover: if the host departs, followers stay
//! unsynchronized until someone creates a new room. That stall is a
//! documented limitation of the protocol, not an oversight.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::{EventEmitter, SessionEvent};
use crate::playback::{PlaybackSurface, PlayerEvent};
use crate::state::{ChangeOrigin, Config, SessionStore, Tagged};
use crate::transport::{GroupTransport, GroupTransportFactory};

use super::sync_protocol::PlaybackSyncProtocol;

/// One active transport-group connection and its sync pump.
struct GroupSession {
    room_id: String,
    transport: Arc<dyn GroupTransport>,
    cancel: CancellationToken,
    pump: JoinHandle<()>,
}

/// Owns the room lifecycle: idle → joining → joined → idle.
///
/// All side effects go through session-store mutation and the injected
/// collaborator traits; the controller renders nothing.
pub struct RoomSessionController {
    store: Arc<SessionStore>,
    transports: Arc<dyn GroupTransportFactory>,
    player: Arc<dyn PlaybackSurface>,
    player_events: broadcast::Sender<PlayerEvent>,
    emitter: Arc<dyn EventEmitter>,
    config: Config,
    /// Room-id subscription, taken by `run`. Created at construction so a
    /// `join_room` issued before the watcher task is first polled is not
    /// lost.
    room_changes: Mutex<Option<watch::Receiver<Tagged<Option<String>>>>>,
}

impl RoomSessionController {
    /// Creates a new controller.
    ///
    /// `player_events` is the channel the playback-surface binding publishes
    /// [`PlayerEvent`]s into; each group session's pump subscribes to it for
    /// the session's lifetime.
    pub fn new(
        store: Arc<SessionStore>,
        transports: Arc<dyn GroupTransportFactory>,
        player: Arc<dyn PlaybackSurface>,
        player_events: broadcast::Sender<PlayerEvent>,
        emitter: Arc<dyn EventEmitter>,
        config: Config,
    ) -> Self {
        Self {
            room_changes: Mutex::new(Some(store.watch_room_id())),
            store,
            transports,
            player,
            player_events,
            emitter,
            config,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed entry points
    // ─────────────────────────────────────────────────────────────────────────

    /// Creates a room and claims the host role.
    ///
    /// Returns the generated room id, the opaque string shared out-of-band
    /// for others to join with.
    pub fn host_room(&self) -> String {
        let room_id = Uuid::new_v4().simple().to_string();
        log::info!("[RoomController] Hosting new room {}", room_id);
        self.store.set_is_hosting(true, ChangeOrigin::LocalUser);
        self.store
            .set_room_id(Some(room_id.clone()), ChangeOrigin::LocalUser);
        room_id
    }

    /// Joins an existing room as a follower.
    pub fn join_room(&self, room_id: impl Into<String>) {
        let room_id = room_id.into();
        log::info!("[RoomController] Joining room {}", room_id);
        self.store.set_is_hosting(false, ChangeOrigin::LocalUser);
        self.store.set_room_id(Some(room_id), ChangeOrigin::LocalUser);
    }

    /// Leaves the current room, if any.
    pub fn leave_room(&self) {
        self.store.set_room_id(None, ChangeOrigin::LocalUser);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle watcher
    // ─────────────────────────────────────────────────────────────────────────

    /// Watches `room_id` changes and drives session creation/teardown.
    ///
    /// Runs for the lifetime of the controller; typically spawned as a
    /// long-lived task. Any live session is torn down on the way out.
    pub async fn run(&self) {
        let Some(rx) = self.room_changes.lock().take() else {
            log::warn!("[RoomController] run() called more than once, ignoring");
            return;
        };
        let mut room_changes = WatchStream::from_changes(rx);
        let mut session: Option<GroupSession> = None;

        while let Some(tagged) = room_changes.next().await {
            // Never run two sessions concurrently: whatever was live goes
            // down before anything new comes up.
            if let Some(old) = session.take() {
                self.teardown(old).await;
            }

            match tagged.value {
                Some(room_id) => {
                    session = Some(self.open_session(room_id).await);
                }
                None => {
                    self.store.reset_room_state();
                }
            }
        }

        if let Some(old) = session.take() {
            self.teardown(old).await;
        }
    }

    async fn open_session(&self, room_id: String) -> GroupSession {
        let (transport, transport_rx) = self.transports.create();
        let cancel = CancellationToken::new();

        let protocol = PlaybackSyncProtocol::new(
            self.store.clone(),
            transport.clone(),
            self.player.clone(),
            self.emitter.clone(),
            &self.config,
        );
        let pump = tokio::spawn(protocol.run(
            transport_rx,
            self.player_events.subscribe(),
            cancel.clone(),
        ));

        if let Err(e) = transport.join(&room_id).await {
            log::warn!("[RoomController] Failed to join room {}: {}", room_id, e);
        }
        self.emitter.emit_session(SessionEvent::RoomJoined {
            room_id: room_id.clone(),
        });

        GroupSession {
            room_id,
            transport,
            cancel,
            pump,
        }
    }

    /// Tears down a session: the pump stops before the transport leaves, so
    /// no broadcast fires and no inbound effect lands once the room id is
    /// gone.
    async fn teardown(&self, session: GroupSession) {
        log::info!("[RoomController] Leaving room {}", session.room_id);
        session.cancel.cancel();
        if let Err(e) = session.pump.await {
            log::warn!("[RoomController] Sync pump ended abnormally: {}", e);
        }
        session.transport.leave().await;
        self.emitter.emit_session(SessionEvent::RoomLeft {
            room_id: session.room_id,
        });
    }
}
