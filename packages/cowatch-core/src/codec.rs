//! Wire codec for playback messages.
//!
//! Pure, stateless, symmetric. Every message is a self-describing flat JSON
//! envelope `{"type": <kind>, "payload": {...}}`, decodable independent of
//! any prior message. Unrecognized kinds decode successfully as
//! [`Decoded::Unknown`] so newer peers can extend the protocol without
//! breaking older ones; only structurally invalid payloads are errors.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::state::VideoState;

/// Wire value of the `type` field for video-load messages.
pub const KIND_VIDEO_ID: &str = "videoId";
/// Wire value of the `type` field for play/pause messages.
pub const KIND_VIDEO_STATE: &str = "videoState";
/// Wire value of the `type` field for time-progress messages.
pub const KIND_VIDEO_TIME: &str = "videoTime";

/// A playback message exchanged between peers.
///
/// Created at the moment a local playback event must be propagated and
/// destroyed after transmission; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlaybackMessage {
    /// The host loaded a new video.
    #[serde(rename = "videoId", rename_all = "camelCase")]
    VideoId {
        /// Opaque video identifier.
        video_id: String,
    },
    /// The host's player reported play or pause.
    #[serde(rename = "videoState", rename_all = "camelCase")]
    VideoState {
        /// New playback state.
        video_state: VideoState,
    },
    /// The host's player reported its playback position.
    #[serde(rename = "videoTime", rename_all = "camelCase")]
    VideoTime {
        /// Position in seconds.
        video_time: f64,
    },
}

/// Outcome of decoding an inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A message kind this protocol version understands.
    Known(PlaybackMessage),
    /// A well-formed envelope with an unrecognized kind.
    ///
    /// Ignored by the protocol layer, not a decode error.
    Unknown(String),
}

/// Serializes a playback message to its wire payload.
pub fn encode(message: &PlaybackMessage) -> SyncResult<Bytes> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(|e| SyncError::MalformedMessage(e.to_string()))
}

/// Deserializes a wire payload.
///
/// # Errors
///
/// Returns [`SyncError::MalformedMessage`] if the payload is not valid JSON,
/// lacks a string `type` field, or carries a recognized kind with an invalid
/// payload shape.
pub fn decode(payload: &[u8]) -> SyncResult<Decoded> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| SyncError::MalformedMessage(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| SyncError::MalformedMessage("missing message type".to_string()))?;

    match kind {
        KIND_VIDEO_ID | KIND_VIDEO_STATE | KIND_VIDEO_TIME => serde_json::from_value(value)
            .map(Decoded::Known)
            .map_err(|e| SyncError::MalformedMessage(e.to_string())),
        other => Ok(Decoded::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_round_trip() {
        let message = PlaybackMessage::VideoId {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        let payload = encode(&message).unwrap();
        assert_eq!(decode(&payload).unwrap(), Decoded::Known(message));
    }

    #[test]
    fn video_state_round_trip() {
        for state in [VideoState::Paused, VideoState::Playing] {
            let message = PlaybackMessage::VideoState { video_state: state };
            let payload = encode(&message).unwrap();
            assert_eq!(decode(&payload).unwrap(), Decoded::Known(message));
        }
    }

    #[test]
    fn video_time_round_trip() {
        let message = PlaybackMessage::VideoTime { video_time: 123.75 };
        let payload = encode(&message).unwrap();
        assert_eq!(decode(&payload).unwrap(), Decoded::Known(message));
    }

    #[test]
    fn wire_format_matches_envelope_shape() {
        let message = PlaybackMessage::VideoId {
            video_id: "abc".to_string(),
        };
        let payload = encode(&message).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["type"], "videoId");
        assert_eq!(value["payload"]["videoId"], "abc");
    }

    #[test]
    fn video_state_serializes_lowercase() {
        let message = PlaybackMessage::VideoState {
            video_state: VideoState::Playing,
        };
        let payload = encode(&message).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["payload"]["videoState"], "playing");
    }

    #[test]
    fn unknown_kind_is_not_an_error() {
        let payload = br#"{"type":"chatMessage","payload":{"text":"hi"}}"#;
        assert_eq!(
            decode(payload).unwrap(),
            Decoded::Unknown("chatMessage".to_string())
        );
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = decode(b"not json").unwrap_err();
        assert_eq!(err.code(), "malformed_message");
    }

    #[test]
    fn missing_type_is_malformed() {
        let err = decode(br#"{"payload":{"videoId":"abc"}}"#).unwrap_err();
        assert_eq!(err.code(), "malformed_message");
    }

    #[test]
    fn non_string_type_is_malformed() {
        let err = decode(br#"{"type":42,"payload":{}}"#).unwrap_err();
        assert_eq!(err.code(), "malformed_message");
    }

    #[test]
    fn known_kind_with_bad_payload_is_malformed() {
        let err = decode(br#"{"type":"videoTime","payload":{"videoTime":"soon"}}"#).unwrap_err();
        assert_eq!(err.code(), "malformed_message");
    }
}
