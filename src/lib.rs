//! Flashguard - photosensitive flash hazard detection
//!
//! This library re-exports the analysis engine, the per-second statistics
//! and the analysis loop from `flashguard-core`.

pub use flashguard_core::analysis;
pub use flashguard_core::config;
pub use flashguard_core::engine;
pub use flashguard_core::frame;
pub use flashguard_core::stats;

pub use flashguard_core::{AnalysisError, AnalysisHandle, AnalysisLoop, EngineConfig, FlashAnalyzer};
pub use flashguard_core::{FrameSource, HazardDecision, HazardState, PixelFrame, SourceEvent, Timeline, Visualization};
pub use flashguard_core::{ANALYSIS_HEIGHT, ANALYSIS_WIDTH, DEFAULT_RATING_THRESHOLD, VERSION};
