//! Event system for real-time client communication.
//!
//! This module provides:
//! - [`EventEmitter`] trait for the sync services to emit events
//! - [`BroadcastEventBridge`] for channel-based transport to UI subscribers
//! - Event types for the session and playback domains

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::state::VideoState;
use crate::transport::PeerId;

/// Events broadcast to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Room lifecycle and membership events.
    Session(SessionEvent),

    /// Applied playback state events.
    Playback(PlaybackEvent),
}

/// Events related to room lifecycle and membership.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// A group session joined a room.
    RoomJoined {
        /// The room identifier.
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// The group session left its room.
    RoomLeft {
        /// The room identifier.
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// A peer joined the room.
    MemberJoined {
        /// The joining peer.
        peer: PeerId,
    },
    /// A peer left the room.
    MemberLeft {
        /// The departed peer.
        peer: PeerId,
    },
    /// The local peer assumed the host role.
    HostAssumed {
        /// The local peer id, if the transport had assigned one.
        #[serde(skip_serializing_if = "Option::is_none")]
        peer: Option<PeerId>,
    },
    /// An inbound payload failed to decode and was dropped.
    MalformedMessage {
        /// The sending peer.
        from: PeerId,
    },
}

/// Events related to playback state applied from the room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// A remote peer loaded a new video.
    VideoLoaded {
        /// The video identifier.
        #[serde(rename = "videoId")]
        video_id: String,
    },
    /// A remote play/pause was applied to the local player.
    StateApplied {
        /// The applied state.
        state: VideoState,
    },
    /// The local player was seeked to correct drift beyond tolerance.
    DriftCorrected {
        /// Player-reported time before the seek (seconds).
        #[serde(rename = "localTime")]
        local_time: f64,
        /// Host-broadcast time seeked to (seconds).
        #[serde(rename = "remoteTime")]
        remote_time: f64,
    },
}

impl From<SessionEvent> for BroadcastEvent {
    fn from(event: SessionEvent) -> Self {
        BroadcastEvent::Session(event)
    }
}

impl From<PlaybackEvent> for BroadcastEvent {
    fn from(event: PlaybackEvent) -> Self {
        BroadcastEvent::Playback(event)
    }
}
