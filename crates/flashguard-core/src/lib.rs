//! Flashguard Core - Flash-hazard analysis engine
//!
//! This library turns a stream of video frames into a protective on/off
//! decision. Each analysis cycle converts a frame into a luminance field,
//! derives a per-pixel delta against the previous frame, scores sign
//! reversals between consecutive deltas and aggregates the result per
//! playback second. A hysteresis state machine turns the current second's
//! statistics into a "show protective cover" signal.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod stats;

pub use analysis::hazard::{HazardDecision, HazardState};
pub use config::EngineConfig;
pub use engine::analyzer::{FlashAnalyzer, Visualization};
pub use engine::runner::{AnalysisHandle, AnalysisLoop};
pub use engine::source::{FrameSource, SourceEvent};
pub use error::AnalysisError;
pub use frame::pixel::PixelFrame;
pub use stats::timeline::Timeline;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default analysis width in pixels, independent of the native video size
pub const ANALYSIS_WIDTH: u32 = 480;

/// Default analysis height in pixels
pub const ANALYSIS_HEIGHT: u32 = 360;

/// Nominal analysis rate the loop cadence targets
pub const NOMINAL_FRAME_RATE: u32 = 30;

/// Default average rating above which a second is considered hazardous
pub const DEFAULT_RATING_THRESHOLD: f64 = 0.06;

/// Upper bound of the documented threshold range
pub const MAX_RATING_THRESHOLD: f64 = 0.3;
