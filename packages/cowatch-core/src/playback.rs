//! Trait abstraction for the video playback surface.
//!
//! The embedded player (load/play/pause/seek, current-time reporting) is an
//! external collaborator. Commands are fire-and-forget; the player reports
//! back through [`PlayerEvent`]s fed to the sync pump.

/// Commands the sync core issues to the local player.
pub trait PlaybackSurface: Send + Sync {
    /// Starts or resumes playback.
    fn play(&self);

    /// Pauses playback.
    fn pause(&self);

    /// Seeks to an absolute position (seconds).
    ///
    /// `allow_seek_ahead` permits seeking into not-yet-buffered regions;
    /// drift correction always passes `true` so followers can jump forward
    /// past their buffer to catch up with the host.
    fn seek_to(&self, time: f64, allow_seek_ahead: bool);

    /// Current playback position (seconds) as reported by the player.
    fn current_time(&self) -> f64;
}

/// Occurrences the player surfaces to this core.
///
/// `Play`/`Pause`/`TimeProgress` represent the *local* player's reports and
/// are recorded as local-origin state writes; whether they propagate to the
/// room is the broadcast policy's decision, not the player binding's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    /// The player finished initializing and accepts commands.
    Ready,
    /// The player started playing.
    Play,
    /// The player paused.
    Pause,
    /// Periodic position report while playing (seconds).
    TimeProgress(f64),
}
