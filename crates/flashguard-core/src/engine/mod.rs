//! Analysis engine
//!
//! This module drives the pipeline:
//! - Frame source and playback notifications ([`source`])
//! - Synthetic test-pattern source ([`pattern`])
//! - One analysis cycle: frame in, hazard state out ([`analyzer`])
//! - The scheduling loop and its control handle ([`runner`])

pub mod analyzer;
pub mod pattern;
pub mod runner;
pub mod source;
