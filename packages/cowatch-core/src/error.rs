//! Centralized error types for the CoWatch core library.
//!
//! Every failure in this crate is non-fatal: malformed messages are dropped,
//! sends without a live group session are no-ops, and transport failures
//! degrade to temporary state divergence until the next successful message.

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type for the CoWatch sync core.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum SyncError {
    /// Inbound payload is not valid structured text or lacks a message kind.
    ///
    /// Dropped and logged by the protocol layer, never fatal.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A send was attempted with no active group session.
    ///
    /// Treated as a no-op by callers, not an exception path.
    #[error("no active group session")]
    TransportUnavailable,

    /// The group transport reported a join or send failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid configuration values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Returns a machine-readable error code for event payloads and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedMessage(_) => "malformed_message",
            Self::TransportUnavailable => "transport_unavailable",
            Self::Transport(_) => "transport_error",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Convenient Result alias for crate-wide operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_message_returns_correct_code() {
        let err = SyncError::MalformedMessage("bad json".into());
        assert_eq!(err.code(), "malformed_message");
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn transport_unavailable_is_not_parameterized() {
        let err = SyncError::TransportUnavailable;
        assert_eq!(err.code(), "transport_unavailable");
        assert_eq!(err.to_string(), "no active group session");
    }
}
