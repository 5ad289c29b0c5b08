//! Synthetic test-pattern frame source
//!
//! Plays back a generated pattern at a fixed frame rate, advancing one frame
//! per pull. Useful for exercising the engine without a real player: a static
//! pattern must never trigger the cover, a black/white strobe must.

use super::source::FrameSource;
use crate::error::AnalysisError;
use crate::frame::pixel::PixelFrame;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque black
pub const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Opaque white
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Marker for "no seek pending"
const NO_SEEK: u64 = u64::MAX;

/// What the source renders
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pattern {
    /// Every frame is the same solid color
    Static([u8; 4]),
    /// Solid colors alternating every `hold_frames` frames
    Alternate {
        first: [u8; 4],
        second: [u8; 4],
        hold_frames: u32,
    },
}

impl Pattern {
    /// Black/white strobe switching every frame
    pub fn strobe() -> Self {
        Pattern::Alternate {
            first: BLACK,
            second: WHITE,
            hold_frames: 1,
        }
    }

    /// Color of frame `index`
    pub fn color_at(&self, index: u64) -> [u8; 4] {
        match *self {
            Pattern::Static(color) => color,
            Pattern::Alternate {
                first,
                second,
                hold_frames,
            } => {
                if (index / hold_frames.max(1) as u64) % 2 == 0 {
                    first
                } else {
                    second
                }
            }
        }
    }
}

/// Shared playback controls for a [`PatternSource`] that has been moved into a loop
#[derive(Debug, Clone)]
pub struct PlaybackControl {
    playing: Arc<AtomicBool>,
    pending_seek: Arc<AtomicU64>,
}

impl PlaybackControl {
    /// Resume playback
    pub fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    /// Pause playback
    pub fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    /// Jump to `frame` before the next pull
    pub fn seek_to_frame(&self, frame: u64) {
        self.pending_seek.store(frame.min(NO_SEEK - 1), Ordering::SeqCst);
    }

    /// Whether playback is currently advancing
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Frame source that renders a [`Pattern`]
#[derive(Debug)]
pub struct PatternSource {
    pattern: Pattern,
    frame_rate: f64,
    /// Index of the next frame to serve
    position: u64,
    /// Playback time of the last frame served
    current_time: f64,
    /// Total frames before playback ends, `None` for endless
    total_frames: Option<u64>,
    control: PlaybackControl,
}

impl PatternSource {
    /// Create an endless, playing source
    pub fn new(pattern: Pattern, frame_rate: f64) -> Self {
        Self {
            pattern,
            frame_rate: if frame_rate > 0.0 { frame_rate } else { 30.0 },
            position: 0,
            current_time: 0.0,
            total_frames: None,
            control: PlaybackControl {
                playing: Arc::new(AtomicBool::new(true)),
                pending_seek: Arc::new(AtomicU64::new(NO_SEEK)),
            },
        }
    }

    /// Stop after `seconds` of content
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.total_frames = Some((seconds.max(0.0) * self.frame_rate).round() as u64);
        self
    }

    /// Controls that stay usable after the source is moved
    pub fn control(&self) -> PlaybackControl {
        self.control.clone()
    }

    /// Index of the next frame to serve
    pub fn position(&self) -> u64 {
        self.position
    }

    fn ended(&self) -> bool {
        self.total_frames.is_some_and(|total| self.position >= total)
    }
}

impl FrameSource for PatternSource {
    fn current_frame(&mut self, width: u32, height: u32) -> Result<PixelFrame, AnalysisError> {
        let seek = self.control.pending_seek.swap(NO_SEEK, Ordering::SeqCst);
        if seek != NO_SEEK {
            self.position = seek;
        }
        if !self.control.is_playing() {
            return Err(AnalysisError::FrameUnavailable("paused".to_string()));
        }
        if self.ended() {
            return Err(AnalysisError::FrameUnavailable("ended".to_string()));
        }

        let frame = PixelFrame::filled(width, height, self.pattern.color_at(self.position));
        self.current_time = self.position as f64 / self.frame_rate;
        self.position += 1;
        Ok(frame)
    }

    fn playback_time(&self) -> f64 {
        self.current_time
    }

    fn is_playing(&self) -> bool {
        self.control.is_playing() && !self.ended()
    }

    fn duration(&self) -> Option<f64> {
        self.total_frames
            .map(|frames| frames as f64 / self.frame_rate)
    }
}
