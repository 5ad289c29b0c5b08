//! Frame source collaborator
//!
//! The engine does not decode video. It pulls frames, already scaled to the
//! analysis resolution, from whatever owns the player.

use crate::error::AnalysisError;
use crate::frame::pixel::PixelFrame;

/// Something that can hand out the currently displayed video frame
pub trait FrameSource: Send {
    /// Capture the current frame scaled to `width` x `height`
    ///
    /// # Errors
    /// `FrameUnavailable` when no frame can be produced right now; the
    /// loop skips the cycle and tries again on the next one.
    fn current_frame(&mut self, width: u32, height: u32) -> Result<PixelFrame, AnalysisError>;

    /// Playback position of the frame last returned, in seconds
    fn playback_time(&self) -> f64;

    /// Whether playback is advancing
    fn is_playing(&self) -> bool;

    /// Total length of the content in seconds, when known
    fn duration(&self) -> Option<f64>;
}

/// Playback notifications delivered to the analysis loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// Playback started or resumed
    Play,
    /// Playback position jumped
    Seek,
    /// Playback paused
    Pause,
    /// Playback reached the end
    Ended,
}

impl SourceEvent {
    /// Whether this event should (re)start analysis
    pub fn starts_analysis(self) -> bool {
        matches!(self, SourceEvent::Play | SourceEvent::Seek)
    }
}
