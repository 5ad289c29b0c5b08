//! Luminance proxy field
//!
//! Brightness is measured as `(r² + g² + b²) / 3` over channels normalized to
//! [0, 1]. This is not photometric luminance: squaring the channels weights
//! bright values much more than dark ones, which exaggerates large swings in
//! brightness, the kind a strobe produces.

use super::pixel::PixelFrame;

/// Luminance proxy of a single RGB sample, in [0, 1]
///
/// # Example
/// ```
/// use flashguard_core::frame::luminance::luminance;
///
/// assert_eq!(luminance(0, 0, 0), 0.0);
/// assert_eq!(luminance(255, 255, 255), 1.0);
/// ```
#[inline]
pub fn luminance(red: u8, green: u8, blue: u8) -> f32 {
    let r = red as f32 / 255.0;
    let g = green as f32 / 255.0;
    let b = blue as f32 / 255.0;
    (r * r + g * g + b * b) / 3.0
}

/// Per-pixel luminance in row-major order, every value in [0, 1]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LuminanceBuffer {
    values: Vec<f32>,
}

impl LuminanceBuffer {
    /// Compute the luminance field of a frame. Alpha is ignored.
    pub fn compute(frame: &PixelFrame) -> Self {
        let values = frame
            .pixels()
            .map(|p| luminance(p[0], p[1], p[2]))
            .collect();
        Self { values }
    }

    /// Build a buffer from precomputed values
    ///
    /// NaN becomes 0 and everything else is clamped into [0, 1], so later
    /// stages never see a value outside the documented range.
    pub fn from_values(values: Vec<f32>) -> Self {
        let values = values
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) })
            .collect();
        Self { values }
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the buffer holds no pixels
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Luminance values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mean luminance of the frame (0 for an empty buffer)
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|&v| v as f64).sum();
        sum / self.values.len() as f64
    }
}
