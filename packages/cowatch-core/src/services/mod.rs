//! Protocol services layer.
//!
//! This module contains the sync logic that orchestrates between the
//! session store and the external collaborators (transport, playback
//! surface).

pub mod host_arbiter;
pub mod room_controller;
pub mod roster;
pub mod sync_protocol;

pub use host_arbiter::HostArbiter;
pub use room_controller::RoomSessionController;
pub use roster::RosterManager;
pub use sync_protocol::PlaybackSyncProtocol;
