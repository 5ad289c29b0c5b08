//! Signed luminance change between two consecutive frames

use super::luminance::LuminanceBuffer;
use crate::error::AnalysisError;

/// Delta above which a pixel is flagged as a bright flash
pub const FLASH_FLAG_THRESHOLD: f32 = 0.1;

/// Visual classification of a single pixel's delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    /// Got brighter by more than [`FLASH_FLAG_THRESHOLD`]
    Bright,
    /// Got darker by more than [`FLASH_FLAG_THRESHOLD`]
    Dark,
    /// Anything in between
    Steady,
}

impl FlashKind {
    /// Classify a single delta value
    pub fn classify(delta: f32) -> Self {
        if delta > FLASH_FLAG_THRESHOLD {
            FlashKind::Bright
        } else if delta < -FLASH_FLAG_THRESHOLD {
            FlashKind::Dark
        } else {
            FlashKind::Steady
        }
    }
}

/// Per-pixel `current - previous` luminance, row-major
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeltaBuffer {
    values: Vec<f32>,
}

impl DeltaBuffer {
    /// Compute the elementwise difference `curr[i] - prev[i]`
    ///
    /// # Errors
    /// `DimensionMismatch` when the two fields have different lengths.
    pub fn compute(prev: &LuminanceBuffer, curr: &LuminanceBuffer) -> Result<Self, AnalysisError> {
        AnalysisError::check_len(prev.len(), curr.len())?;
        let values = prev
            .values()
            .iter()
            .zip(curr.values())
            .map(|(p, c)| c - p)
            .collect();
        Ok(Self { values })
    }

    /// Wrap raw delta values as-is
    pub fn from_values(values: Vec<f32>) -> Self {
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

    /// Delta values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Classification of every pixel, used only for visualization
    pub fn flash_mask(&self) -> Vec<FlashKind> {
        self.values.iter().map(|&d| FlashKind::classify(d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(values: &[f32]) -> LuminanceBuffer {
        LuminanceBuffer::from_values(values.to_vec())
    }

    #[test]
    fn test_compute() {
        let delta = DeltaBuffer::compute(&field(&[0.0, 0.5, 1.0]), &field(&[1.0, 0.5, 0.25])).unwrap();
        assert_eq!(delta.values(), &[1.0, 0.0, -0.75]);
    }

    #[test]
    fn test_antisymmetry() {
        let a = field(&[0.1, 0.9, 0.33, 0.0, 0.7]);
        let b = field(&[0.6, 0.2, 0.33, 1.0, 0.01]);
        let ab = DeltaBuffer::compute(&a, &b).unwrap();
        let ba = DeltaBuffer::compute(&b, &a).unwrap();
        for (x, y) in ab.values().iter().zip(ba.values()) {
            assert_eq!(*x, -*y);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = DeltaBuffer::compute(&field(&[0.0, 0.0]), &field(&[0.0])).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_classify() {
        assert_eq!(FlashKind::classify(0.11), FlashKind::Bright);
        assert_eq!(FlashKind::classify(-0.11), FlashKind::Dark);
        assert_eq!(FlashKind::classify(0.1), FlashKind::Steady);
        assert_eq!(FlashKind::classify(-0.1), FlashKind::Steady);
        assert_eq!(FlashKind::classify(0.0), FlashKind::Steady);
    }

    #[test]
    fn test_flash_mask() {
        let delta = DeltaBuffer::from_values(vec![0.5, -0.5, 0.05]);
        assert_eq!(
            delta.flash_mask(),
            vec![FlashKind::Bright, FlashKind::Dark, FlashKind::Steady]
        );
    }
}
