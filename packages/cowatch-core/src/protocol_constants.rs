//! Fixed protocol constants.
//!
//! These values are part of the sync protocol's observable behavior; changing
//! them changes how peers converge and should be done through [`Config`]
//! overrides rather than by editing this file.
//!
//! [`Config`]: crate::state::Config

/// Drift-correction tolerance (seconds).
///
/// A follower seeks to the host's broadcast time only when the absolute
/// difference to its own playback position exceeds this value. The threshold
/// is exclusive: a deviation of exactly this many seconds does not seek.
///
/// Network jitter and independent clock drift make exact synchronization both
/// impossible and unnecessary; 2 seconds is the perceptibility threshold
/// below which viewers do not notice the offset.
pub const DRIFT_TOLERANCE_SECS: f64 = 2.0;

/// Capacity of the event broadcast channel for UI/telemetry subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Capacity of the player event channel feeding the sync pump.
///
/// Player time-progress notifications arrive continuously while playing;
/// 64 pending events is ample headroom for a pump that drains every event
/// before touching the network.
pub const PLAYER_EVENT_CHANNEL_CAPACITY: usize = 64;
