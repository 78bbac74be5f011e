//! Trait abstractions for the group transport.
//!
//! The peer mesh (discovery, reliable delivery, membership tracking) is an
//! external collaborator. The core consumes it through [`GroupTransport`] and
//! receives its callbacks as a [`TransportEvent`] stream, which keeps the
//! protocol state machine testable without a real mesh.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::SyncResult;

/// Peer identifier assigned by the group transport.
pub type PeerId = u64;

/// Connection state of the active group session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    /// No group session, or the previous session has fully torn down.
    #[default]
    Disconnected,
    /// Join requested, mesh construction in progress.
    Connecting,
    /// Joined; membership callbacks and message delivery are live.
    Connected,
    /// Leave requested, teardown in progress.
    Disconnecting,
}

/// Inbound occurrences the transport surfaces to this core.
///
/// One variant per transport callback. Events for a group session are
/// delivered in arrival order over a single channel, preserving each sender's
/// send order; no global ordering across senders is assumed.
#[derive(Debug)]
pub enum TransportEvent {
    /// The transport assigned the local peer its identifier.
    SelfIdAssigned(PeerId),
    /// A peer joined the room.
    MemberJoined(PeerId),
    /// A peer left the room.
    MemberLeft(PeerId),
    /// A payload arrived from a peer.
    Message {
        /// Sending peer.
        from: PeerId,
        /// Opaque wire payload; decoded by the message codec.
        payload: Bytes,
    },
    /// The session's connection state changed.
    ConnectionStateChanged(ConnectionState),
}

/// Handle to one active transport-group connection.
///
/// Sends are fire-and-forget: the protocol layer never awaits delivery
/// acknowledgment. `send`/`send_to` after the underlying session is gone must
/// return [`SyncError::TransportUnavailable`] rather than panic; callers
/// treat that as a no-op.
///
/// [`SyncError::TransportUnavailable`]: crate::error::SyncError::TransportUnavailable
#[async_trait]
pub trait GroupTransport: Send + Sync {
    /// Requests that this session join the given room.
    async fn join(&self, room_id: &str) -> SyncResult<()>;

    /// Requests that this session leave its room. Idempotent.
    async fn leave(&self);

    /// Broadcasts a payload to all current members.
    fn send(&self, payload: Bytes) -> SyncResult<()>;

    /// Sends a payload to a single member.
    fn send_to(&self, peer: PeerId, payload: Bytes) -> SyncResult<()>;

    /// Current roster snapshot, unordered, readable at callback time.
    fn members(&self) -> Vec<PeerId>;
}

/// Creates one fresh transport session per room join.
///
/// The returned receiver carries every [`TransportEvent`] for that session
/// and only that session; dropping it (when the session is torn down)
/// guarantees no stale inbound effects are applied for an old room.
pub trait GroupTransportFactory: Send + Sync {
    /// Creates a new, not-yet-joined group session.
    fn create(&self) -> (Arc<dyn GroupTransport>, mpsc::UnboundedReceiver<TransportEvent>);
}
