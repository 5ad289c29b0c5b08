//! Statistics storage
//!
//! Accumulates luminance and rating samples per playback second for the
//! hazard decision and the risk map.

pub mod counter;
pub mod timeline;
