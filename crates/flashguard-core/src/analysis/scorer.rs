//! Flash transition scoring
//!
//! A pixel that was getting brighter and is now getting darker (or the other
//! way round) has reversed direction between two delta samples. Strobing
//! content produces exactly that, frame after frame, so the rating sums the
//! size of every reversal and averages it over the frame. Monotonic change,
//! however fast, scores zero.
//!
//! Two scorers live here. [`score`] drives the hazard decision and uses a
//! strict sign test. [`transition_map`] is only for visualization: a pixel
//! counts when its delta moves from above [`TRANSITION_NOISE_THRESHOLD`] to
//! below it, or from below it to above it. That also marks a strong change
//! settling back into the band, not just full sign reversals.

use crate::error::AnalysisError;
use crate::frame::delta::DeltaBuffer;

/// Delta level the visualization scorer measures crossings against
pub const TRANSITION_NOISE_THRESHOLD: f32 = 0.05;

/// Size of the sign reversal between two delta samples of one pixel, or 0
#[inline]
fn reversal(prev: f32, curr: f32) -> f32 {
    if !prev.is_finite() || !curr.is_finite() {
        return 0.0;
    }
    if prev > 0.0 && curr < 0.0 {
        prev - curr
    } else if prev < 0.0 && curr > 0.0 {
        curr - prev
    } else {
        0.0
    }
}

/// Size of a crossing of [`TRANSITION_NOISE_THRESHOLD`] between two delta samples, or 0
#[inline]
fn crossing(prev: f32, curr: f32) -> f32 {
    if !prev.is_finite() || !curr.is_finite() {
        return 0.0;
    }
    let level = TRANSITION_NOISE_THRESHOLD;
    if prev > level && curr < level {
        prev - curr
    } else if prev < level && curr > level {
        curr - prev
    } else {
        0.0
    }
}

/// Average reversal magnitude per pixel between two consecutive deltas
///
/// Non-finite deltas contribute nothing. An empty frame scores 0.
///
/// # Errors
/// `DimensionMismatch` when the buffers have different lengths.
///
/// # Example
/// ```
/// use flashguard_core::analysis::scorer::score;
/// use flashguard_core::frame::delta::DeltaBuffer;
///
/// let up = DeltaBuffer::from_values(vec![1.0, 1.0]);
/// let down = DeltaBuffer::from_values(vec![-1.0, -1.0]);
/// assert_eq!(score(&up, &down).unwrap(), 2.0);
/// assert_eq!(score(&up, &up).unwrap(), 0.0);
/// ```
pub fn score(prev: &DeltaBuffer, curr: &DeltaBuffer) -> Result<f64, AnalysisError> {
    AnalysisError::check_len(prev.len(), curr.len())?;
    if prev.is_empty() {
        return Ok(0.0);
    }

    let total: f64 = prev
        .values()
        .iter()
        .zip(curr.values())
        .map(|(&p, &c)| reversal(p, c) as f64)
        .sum();

    Ok(total / prev.len() as f64)
}

/// Per-pixel magnitude of deltas crossing [`TRANSITION_NOISE_THRESHOLD`]
///
/// # Errors
/// `DimensionMismatch` when the buffers have different lengths.
pub fn transition_map(prev: &DeltaBuffer, curr: &DeltaBuffer) -> Result<Vec<f32>, AnalysisError> {
    AnalysisError::check_len(prev.len(), curr.len())?;
    Ok(prev
        .values()
        .iter()
        .zip(curr.values())
        .map(|(&p, &c)| crossing(p, c))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn delta(values: &[f32]) -> DeltaBuffer {
        DeltaBuffer::from_values(values.to_vec())
    }

    #[test]
    fn test_reversal_magnitude() {
        let rating = score(&delta(&[0.5, -0.25, 0.0, 0.0]), &delta(&[-0.5, 0.25, 0.0, 0.0])).unwrap();
        // (1.0 + 0.5) / 4
        assert_relative_eq!(rating, 0.375, epsilon = 1e-9);
    }

    #[test]
    fn test_monotone_change_scores_zero() {
        let brighter = delta(&[0.9, 0.1, 0.0, 0.4]);
        let still_brighter = delta(&[0.2, 0.8, 0.3, 0.0]);
        assert_eq!(score(&brighter, &still_brighter).unwrap(), 0.0);

        let darker = delta(&[-0.9, -0.1, 0.0, -0.4]);
        let still_darker = delta(&[-0.2, -0.8, -0.3, 0.0]);
        assert_eq!(score(&darker, &still_darker).unwrap(), 0.0);
    }

    #[test]
    fn test_sign_flip_symmetry() {
        let prev = [0.3, -0.7, 0.05, -0.01, 0.6];
        let curr = [-0.2, 0.4, -0.5, 0.02, 0.1];
        let negate = |v: &[f32]| v.iter().map(|x| -x).collect::<Vec<_>>();

        let rating = score(&delta(&prev), &delta(&curr)).unwrap();
        let flipped = score(
            &DeltaBuffer::from_values(negate(&prev)),
            &DeltaBuffer::from_values(negate(&curr)),
        )
        .unwrap();
        assert_eq!(rating, flipped);
        assert!(rating > 0.0);
    }

    #[test]
    fn test_non_finite_contributes_zero() {
        let rating = score(
            &delta(&[f32::NAN, f32::INFINITY, 1.0]),
            &delta(&[-1.0, -1.0, f32::NEG_INFINITY]),
        )
        .unwrap();
        assert_eq!(rating, 0.0);
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(score(&delta(&[]), &delta(&[])).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            score(&delta(&[0.1]), &delta(&[0.1, 0.2])),
            Err(AnalysisError::DimensionMismatch { .. })
        ));
        assert!(transition_map(&delta(&[0.1]), &delta(&[])).is_err());
    }

    #[test]
    fn test_transition_map_crossings() {
        let map = transition_map(&delta(&[0.04, 0.3, -0.3, 0.3]), &delta(&[-0.04, -0.3, 0.3, -0.01])).unwrap();
        assert_eq!(map[0], 0.0, "both inside the band");
        assert_relative_eq!(map[1], 0.6, epsilon = 1e-6);
        assert_relative_eq!(map[2], 0.6, epsilon = 1e-6);
        assert_relative_eq!(map[3], 0.31, epsilon = 1e-6);
    }

    #[test]
    fn test_transition_map_counts_settling_into_band() {
        let map = transition_map(&delta(&[0.3, 0.3, -0.3]), &delta(&[0.0, 0.04, 0.0])).unwrap();
        assert_relative_eq!(map[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(map[1], 0.26, epsilon = 1e-6);
        assert_eq!(map[2], 0.0, "never rises above the level");
    }

    #[test]
    fn test_transition_map_counts_rise_above_level() {
        let map = transition_map(&delta(&[0.0, -0.2]), &delta(&[0.3, 0.06])).unwrap();
        assert_relative_eq!(map[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(map[1], 0.26, epsilon = 1e-6);
        // The decision scorer only sees the second pixel reverse
        let rating = score(&delta(&[0.0, -0.2]), &delta(&[0.3, 0.06])).unwrap();
        assert_relative_eq!(rating, 0.13, epsilon = 1e-6);
    }

    #[test]
    fn test_transition_map_non_finite() {
        let map = transition_map(&delta(&[f32::NAN, 0.3]), &delta(&[0.3, f32::INFINITY])).unwrap();
        assert_eq!(map, vec![0.0, 0.0]);
    }

    #[test]
    fn test_scorers_differ_on_small_reversals() {
        let prev = delta(&[0.04]);
        let curr = delta(&[-0.04]);
        assert!(score(&prev, &curr).unwrap() > 0.0);
        assert_eq!(transition_map(&prev, &curr).unwrap(), vec![0.0]);
    }
}
