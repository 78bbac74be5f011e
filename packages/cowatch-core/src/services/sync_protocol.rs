//! Playback synchronization protocol.
//!
//! The central state machine of the sync core. One pump task per group
//! session drains transport events, local player events, and state-store
//! subscriptions through a single `select!` loop, so protocol logic never
//! executes concurrently with itself and every effect lands in arrival
//! order.
//!
//! Responsibilities:
//! - Outbound broadcast policy (host-only, local-origin writes only)
//! - Inbound message application with origin tagging
//! - Drift correction against the player's reported position
//! - Late-joiner catch-up unicast
//! - Roster and host-role bookkeeping via [`RosterManager`] / [`HostArbiter`]

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::codec::{self, Decoded, PlaybackMessage};
use crate::events::{EventEmitter, PlaybackEvent, SessionEvent};
use crate::playback::{PlaybackSurface, PlayerEvent};
use crate::state::{ChangeOrigin, Config, SessionStore, Tagged, VideoState};
use crate::transport::{GroupTransport, PeerId, TransportEvent};

use super::host_arbiter::HostArbiter;
use super::roster::RosterManager;

/// Reacts to local and remote playback events for one group session.
///
/// Constructed per session by the room session controller; consumed by
/// [`run`](Self::run), which exits when the session's cancellation token
/// fires. After that point no broadcast is sent and no inbound effect is
/// applied for the old session.
pub struct PlaybackSyncProtocol {
    store: Arc<SessionStore>,
    transport: Arc<dyn GroupTransport>,
    player: Arc<dyn PlaybackSurface>,
    emitter: Arc<dyn EventEmitter>,
    roster: RosterManager,
    arbiter: HostArbiter,
    drift_tolerance_secs: f64,
}

impl PlaybackSyncProtocol {
    /// Creates a new protocol instance for one group session.
    pub fn new(
        store: Arc<SessionStore>,
        transport: Arc<dyn GroupTransport>,
        player: Arc<dyn PlaybackSurface>,
        emitter: Arc<dyn EventEmitter>,
        config: &Config,
    ) -> Self {
        Self {
            roster: RosterManager::new(store.clone()),
            arbiter: HostArbiter::new(store.clone(), emitter.clone()),
            store,
            transport,
            player,
            emitter,
            drift_tolerance_secs: config.drift_tolerance_secs,
        }
    }

    /// Pumps events until cancelled.
    pub async fn run(
        self,
        mut transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
        mut player_rx: broadcast::Receiver<PlayerEvent>,
        cancel: CancellationToken,
    ) {
        let mut video_id_rx = self.store.watch_video_id();
        let mut video_state_rx = self.store.watch_video_state();
        let mut video_time_rx = self.store.watch_video_time();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(event) = transport_rx.recv() => self.handle_transport_event(event),
                event = player_rx.recv() => match event {
                    Ok(event) => self.handle_player_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("[SyncProtocol] Player event stream lagged, skipped {}", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Ok(()) = video_id_rx.changed() => {
                    let tagged = video_id_rx.borrow_and_update().clone();
                    self.on_video_id_changed(tagged);
                }
                Ok(()) = video_state_rx.changed() => {
                    let tagged = video_state_rx.borrow_and_update().clone();
                    self.on_video_state_changed(tagged);
                }
                Ok(()) = video_time_rx.changed() => {
                    let tagged = video_time_rx.borrow_and_update().clone();
                    self.on_video_time_changed(tagged);
                }
            }
        }

        log::debug!("[SyncProtocol] Pump stopped");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport events
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::SelfIdAssigned(id) => self.roster.on_self_id_assigned(id),
            TransportEvent::MemberJoined(id) => {
                self.roster.on_member_joined(id, self.transport.members());
                self.emitter.emit_session(SessionEvent::MemberJoined { peer: id });
                self.catch_up_member(id);
            }
            TransportEvent::MemberLeft(id) => {
                self.roster.on_member_left(id, self.transport.members());
                self.emitter.emit_session(SessionEvent::MemberLeft { peer: id });
            }
            TransportEvent::ConnectionStateChanged(state) => {
                self.arbiter
                    .on_connection_state_changed(state, self.transport.members().len());
            }
            TransportEvent::Message { from, payload } => self.apply_message(from, &payload),
        }
    }

    /// Unicasts the current video and playback state to a freshly joined
    /// member so late joiners converge without waiting for the next host
    /// state change. Host-only; no-op while no video is loaded.
    fn catch_up_member(&self, peer: PeerId) {
        if !self.store.is_hosting() {
            return;
        }
        let Some(video_id) = self.store.video_id() else {
            return;
        };

        log::debug!("[SyncProtocol] Catching up late joiner {}", peer);
        self.send_to(peer, &PlaybackMessage::VideoId { video_id });
        self.send_to(
            peer,
            &PlaybackMessage::VideoState {
                video_state: self.store.video_state(),
            },
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inbound apply
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn apply_message(&self, from: PeerId, payload: &Bytes) {
        match codec::decode(payload) {
            Ok(Decoded::Known(message)) => self.apply(message),
            Ok(Decoded::Unknown(kind)) => {
                log::debug!("[SyncProtocol] Ignoring unknown message kind {:?} from {}", kind, from);
            }
            Err(e) => {
                log::warn!("[SyncProtocol] Dropping malformed message from {}: {}", from, e);
                self.emitter.emit_session(SessionEvent::MalformedMessage { from });
            }
        }
    }

    /// Applies a decoded remote message. All writes carry
    /// [`ChangeOrigin::Remote`], which is what keeps them out of the
    /// broadcast policy.
    fn apply(&self, message: PlaybackMessage) {
        match message {
            PlaybackMessage::VideoId { video_id } => {
                self.store.set_video_id(Some(video_id.clone()), ChangeOrigin::Remote);
                self.emitter.emit_playback(PlaybackEvent::VideoLoaded { video_id });
            }
            PlaybackMessage::VideoState { video_state } => {
                self.store.set_video_state(video_state, ChangeOrigin::Remote);
                match video_state {
                    VideoState::Playing => self.player.play(),
                    VideoState::Paused => self.player.pause(),
                }
                self.emitter
                    .emit_playback(PlaybackEvent::StateApplied { state: video_state });
            }
            PlaybackMessage::VideoTime { video_time } => {
                self.store.set_video_time(video_time, ChangeOrigin::Remote);
                self.correct_drift(video_time);
            }
        }
    }

    /// Seeks the local player to the host's time when the deviation exceeds
    /// tolerance. The threshold is exclusive: a deviation of exactly the
    /// tolerance does not seek.
    fn correct_drift(&self, remote_time: f64) {
        let local_time = self.player.current_time();
        if (remote_time - local_time).abs() > self.drift_tolerance_secs {
            log::debug!(
                "[SyncProtocol] Drift {:.2}s exceeds tolerance, seeking {:.2} -> {:.2}",
                (remote_time - local_time).abs(),
                local_time,
                remote_time
            );
            self.player.seek_to(remote_time, true);
            self.emitter.emit_playback(PlaybackEvent::DriftCorrected {
                local_time,
                remote_time,
            });
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Local player events
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn handle_player_event(&self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready => log::debug!("[SyncProtocol] Player ready"),
            PlayerEvent::Play => {
                self.store.set_video_state(VideoState::Playing, ChangeOrigin::LocalUser);
            }
            PlayerEvent::Pause => {
                self.store.set_video_state(VideoState::Paused, ChangeOrigin::LocalUser);
            }
            PlayerEvent::TimeProgress(time) => {
                self.store.set_video_time(time, ChangeOrigin::LocalUser);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outbound broadcast policy
    // ─────────────────────────────────────────────────────────────────────────

    /// A store write is broadcast only when the local peer is hosting and
    /// the write originated from a local user action. Remote-applied and
    /// lifecycle writes are filtered here, which is the echo-suppression
    /// mechanism.
    fn should_broadcast(&self, origin: ChangeOrigin) -> bool {
        origin == ChangeOrigin::LocalUser && self.store.is_hosting()
    }

    pub(crate) fn on_video_id_changed(&self, tagged: Tagged<Option<String>>) {
        if !self.should_broadcast(tagged.origin) {
            return;
        }
        let Some(video_id) = tagged.value else {
            return;
        };

        self.broadcast(&PlaybackMessage::VideoId {
            video_id: video_id.clone(),
        });
        if let Some(author) = self.store.local_peer_id() {
            self.store.append_chat(author, format!("Loaded video {}", video_id));
        }
    }

    pub(crate) fn on_video_state_changed(&self, tagged: Tagged<VideoState>) {
        if !self.should_broadcast(tagged.origin) {
            return;
        }
        self.broadcast(&PlaybackMessage::VideoState {
            video_state: tagged.value,
        });
    }

    pub(crate) fn on_video_time_changed(&self, tagged: Tagged<f64>) {
        if !self.should_broadcast(tagged.origin) {
            return;
        }
        self.broadcast(&PlaybackMessage::VideoTime {
            video_time: tagged.value,
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Send helpers (fire-and-forget, best-effort)
    // ─────────────────────────────────────────────────────────────────────────

    fn broadcast(&self, message: &PlaybackMessage) {
        match codec::encode(message) {
            Ok(payload) => {
                if let Err(e) = self.transport.send(payload) {
                    log::warn!("[SyncProtocol] Broadcast failed: {}", e);
                }
            }
            Err(e) => log::warn!("[SyncProtocol] Failed to encode broadcast: {}", e),
        }
    }

    fn send_to(&self, peer: PeerId, message: &PlaybackMessage) {
        match codec::encode(message) {
            Ok(payload) => {
                if let Err(e) = self.transport.send_to(peer, payload) {
                    log::warn!("[SyncProtocol] Unicast to {} failed: {}", peer, e);
                }
            }
            Err(e) => log::warn!("[SyncProtocol] Failed to encode unicast: {}", e),
        }
    }
}
