//! Hazard analysis
//!
//! - Oscillation rating between consecutive delta buffers ([`scorer`])
//! - Hysteresis-gated protective cover decision ([`hazard`])

pub mod hazard;
pub mod scorer;
