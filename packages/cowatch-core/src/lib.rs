//! CoWatch Core - session synchronization for shared group video playback.
//!
//! This crate keeps a set of peers watching the same video in lockstep: one
//! peer hosts a room and its playback state is authoritative; followers
//! apply received state and correct drift by seeking when their player
//! deviates beyond tolerance. Synchronization is best-effort eventual
//! convergence, not strong consistency.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`state`]: The shared observable session store and configuration
//! - [`codec`]: Wire codec for playback messages
//! - [`transport`]: Group transport trait seam and inbound event types
//! - [`playback`]: Playback surface trait seam and player events
//! - [`events`]: Event system for real-time client communication
//! - [`services`]: Room lifecycle, roster, host arbitration, and the sync
//!   protocol pump
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! External collaborators are consumed through traits so the protocol state
//! machine is testable without a real mesh or player:
//!
//! - [`GroupTransport`](transport::GroupTransport) /
//!   [`GroupTransportFactory`](transport::GroupTransportFactory): the peer
//!   mesh
//! - [`PlaybackSurface`](playback::PlaybackSurface): the video player
//! - [`EventEmitter`](events::EventEmitter): domain event delivery

#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod events;
pub mod playback;
pub mod protocol_constants;
pub mod services;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at the crate root
pub use codec::{Decoded, PlaybackMessage};
pub use error::{SyncError, SyncResult};
pub use events::{
    BroadcastEvent, BroadcastEventBridge, EventEmitter, LoggingEventEmitter, NoopEventEmitter,
    PlaybackEvent, SessionEvent,
};
pub use playback::{PlaybackSurface, PlayerEvent};
pub use protocol_constants::DRIFT_TOLERANCE_SECS;
pub use services::{HostArbiter, PlaybackSyncProtocol, RoomSessionController, RosterManager};
pub use state::{
    ChangeOrigin, ChatEntry, Config, SessionState, SessionStore, Tagged, VideoState,
};
pub use transport::{
    ConnectionState, GroupTransport, GroupTransportFactory, PeerId, TransportEvent,
};
