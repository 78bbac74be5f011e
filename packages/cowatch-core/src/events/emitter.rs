//! Event emitter abstraction for decoupling services from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than concrete
//! broadcast channels, enabling testing and alternative delivery
//! implementations.

use super::{PlaybackEvent, SessionEvent};

/// Trait for emitting domain events without knowledge of transport.
pub trait EventEmitter: Send + Sync {
    /// Emits a room lifecycle or membership event.
    fn emit_session(&self, event: SessionEvent);

    /// Emits an applied playback state event.
    fn emit_playback(&self, event: PlaybackEvent);
}

/// No-op emitter for headless use or testing.
///
/// Events are silently discarded.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_session(&self, _event: SessionEvent) {
        // No-op
    }

    fn emit_playback(&self, _event: PlaybackEvent) {
        // No-op
    }
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_session(&self, event: SessionEvent) {
        tracing::debug!(?event, "session_event");
    }

    fn emit_playback(&self, event: PlaybackEvent) {
        tracing::debug!(?event, "playback_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test emitter that counts events.
    struct CountingEventEmitter {
        session_count: AtomicUsize,
        playback_count: AtomicUsize,
    }

    impl CountingEventEmitter {
        fn new() -> Self {
            Self {
                session_count: AtomicUsize::new(0),
                playback_count: AtomicUsize::new(0),
            }
        }
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_session(&self, _event: SessionEvent) {
            self.session_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_playback(&self, _event: PlaybackEvent) {
            self.playback_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter::new());

        emitter.emit_session(SessionEvent::RoomJoined {
            room_id: "room-1".to_string(),
        });
        emitter.emit_session(SessionEvent::MemberJoined { peer: 2 });
        emitter.emit_playback(PlaybackEvent::VideoLoaded {
            video_id: "abc".to_string(),
        });

        assert_eq!(emitter.session_count.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.playback_count.load(Ordering::SeqCst), 1);
    }
}
