//! Per-frame buffers
//!
//! This module contains the data that lives for a single analysis cycle:
//! - Raw RGBA frames captured at the analysis resolution ([`pixel`])
//! - Per-pixel luminance proxy ([`luminance`])
//! - Signed luminance deltas between consecutive frames ([`delta`])

pub mod delta;
pub mod luminance;
pub mod pixel;
