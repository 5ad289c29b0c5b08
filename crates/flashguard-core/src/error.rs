//! Error types shared by every pipeline stage

use thiserror::Error;

/// Errors that can occur during an analysis cycle
///
/// None of these are fatal to the engine: a failing cycle is skipped and the
/// loop carries on with the next one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Two buffers that must line up pixel for pixel have different lengths
    #[error("Buffer length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Average or dispersion requested before any sample was recorded
    #[error("No samples recorded")]
    EmptyAccumulator,

    /// The frame source could not produce a frame this cycle
    #[error("Frame unavailable: {0}")]
    FrameUnavailable(String),
}

impl AnalysisError {
    /// Build a mismatch error only when the lengths differ
    pub(crate) fn check_len(expected: usize, actual: usize) -> Result<(), AnalysisError> {
        if expected == actual {
            Ok(())
        } else {
            Err(AnalysisError::DimensionMismatch { expected, actual })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(AnalysisError::check_len(4, 4).is_ok());
        assert_eq!(
            AnalysisError::check_len(4, 3),
            Err(AnalysisError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_display() {
        let err = AnalysisError::FrameUnavailable("paused".to_string());
        assert_eq!(err.to_string(), "Frame unavailable: paused");
    }
}
