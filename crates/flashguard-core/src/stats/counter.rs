//! Streaming average and roughness accumulator
//!
//! `dispersion` is the mean of squared differences between successive
//! samples, not the variance around the mean. A signal that jumps up and
//! down around a steady mean scores high here, which is what flash detection
//! is after. The hazard threshold was tuned against this exact formula.

use crate::error::AnalysisError;
use serde::Serialize;

/// Incremental count / sum / successive-difference accumulator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VarianceCounter {
    count: u64,
    sum: f64,
    /// Sum of `(previous - value)²` over successive samples
    variance_accumulator: f64,
    previous: Option<f64>,
}

impl VarianceCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample
    ///
    /// Non-finite values are recorded as 0 so a single bad sample cannot
    /// poison the whole second.
    pub fn record(&mut self, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.count += 1;
        self.sum += value;
        if let Some(previous) = self.previous {
            let diff = previous - value;
            self.variance_accumulator += diff * diff;
        }
        self.previous = Some(value);
    }

    /// Number of recorded samples
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of recorded samples
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Raw successive-difference accumulator
    pub fn variance_accumulator(&self) -> f64 {
        self.variance_accumulator
    }

    /// Most recently recorded sample
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// `sum / count`
    ///
    /// # Errors
    /// `EmptyAccumulator` before the first sample.
    pub fn average(&self) -> Result<f64, AnalysisError> {
        if self.count == 0 {
            return Err(AnalysisError::EmptyAccumulator);
        }
        Ok(self.sum / self.count as f64)
    }

    /// `variance_accumulator / count`
    ///
    /// # Errors
    /// `EmptyAccumulator` before the first sample.
    pub fn dispersion(&self) -> Result<f64, AnalysisError> {
        if self.count == 0 {
            return Err(AnalysisError::EmptyAccumulator);
        }
        Ok(self.variance_accumulator / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_counter() {
        let counter = VarianceCounter::new();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.average(), Err(AnalysisError::EmptyAccumulator));
        assert_eq!(counter.dispersion(), Err(AnalysisError::EmptyAccumulator));
    }

    #[test]
    fn test_bootstrap() {
        let mut counter = VarianceCounter::new();
        counter.record(0.7);
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.dispersion().unwrap(), 0.0);
        assert_eq!(counter.average().unwrap(), 0.7);
    }

    #[test]
    fn test_successive_differences() {
        let mut counter = VarianceCounter::new();
        for v in [1.0, 3.0, 2.0] {
            counter.record(v);
        }
        assert_eq!(counter.count(), 3);
        assert_eq!(counter.average().unwrap(), 2.0);
        assert_eq!(counter.variance_accumulator(), 5.0);
        assert_relative_eq!(counter.dispersion().unwrap(), 5.0 / 3.0);
    }

    #[test]
    fn test_differs_from_population_variance() {
        // Alternating around a constant mean: population variance is 1,
        // successive-difference dispersion is much larger
        let mut counter = VarianceCounter::new();
        for i in 0..10 {
            counter.record(if i % 2 == 0 { 1.0 } else { -1.0 });
        }
        assert_eq!(counter.average().unwrap(), 0.0);
        assert_relative_eq!(counter.dispersion().unwrap(), 9.0 * 4.0 / 10.0);
    }

    #[test]
    fn test_constant_series_has_zero_dispersion() {
        let mut counter = VarianceCounter::new();
        for _ in 0..30 {
            counter.record(0.42);
        }
        assert_eq!(counter.dispersion().unwrap(), 0.0);
    }

    #[test]
    fn test_non_finite_recorded_as_zero() {
        let mut counter = VarianceCounter::new();
        counter.record(f64::NAN);
        counter.record(f64::INFINITY);
        counter.record(1.0);
        assert_eq!(counter.count(), 3);
        assert_eq!(counter.sum(), 1.0);
        assert_eq!(counter.variance_accumulator(), 1.0);
        assert!(counter.dispersion().unwrap().is_finite());
    }
}
