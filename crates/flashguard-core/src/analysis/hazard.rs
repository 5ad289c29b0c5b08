//! Protective cover decision with hysteresis
//!
//! The decision looks only at the current playback second's rating
//! statistics. Once the average rating crosses the threshold the cover is
//! shown and a cool-down starts; while it runs the cover cannot be cleared
//! even if the rating drops, which keeps the cover itself from flickering.
//! Every new above-threshold sample restarts the cool-down.

use crate::config::EngineConfig;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Factor applied to the raw rating average for display
pub const DISPLAY_SCALE: f64 = 256.0;

/// Computed cover state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoverState {
    /// No hazard detected, cover hidden
    Calm,
    /// Hazard detected, cover shown
    Warning,
}

/// Externally visible hazard output of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HazardState {
    /// Whether the presentation layer should show the protective cover
    pub show_cover: bool,
    /// Rating average of the current second
    pub rating_average: f64,
    /// Rating average scaled for display
    pub display_value: f64,
    /// True when the user has dismissed the cover for this session
    pub suppressed: bool,
}

impl Default for HazardState {
    fn default() -> Self {
        Self {
            show_cover: false,
            rating_average: 0.0,
            display_value: 0.0,
            suppressed: false,
        }
    }
}

/// Hysteresis state machine driving the protective cover
///
/// # Example
/// ```
/// use flashguard_core::analysis::hazard::HazardDecision;
/// use flashguard_core::EngineConfig;
/// use std::time::Instant;
///
/// let mut decision = HazardDecision::new(&EngineConfig::default());
/// let now = Instant::now();
///
/// // Too few samples: nothing happens
/// assert!(!decision.evaluate(5, 1.0, now).show_cover);
///
/// // Enough samples above threshold: cover shown
/// assert!(decision.evaluate(11, 1.0, now).show_cover);
/// ```
#[derive(Debug)]
pub struct HazardDecision {
    state: CoverState,
    /// Automatic return to Calm is blocked until this instant
    cooldown_until: Option<Instant>,
    /// Set by explicit user override, cleared only by reset
    suppressed: bool,
    /// Rating average seen by the last evaluation
    last_rating_average: f64,
    threshold: f64,
    min_samples: u64,
    cooldown: Duration,
}

impl HazardDecision {
    /// Create a calm decision using the thresholds from `config`
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: CoverState::Calm,
            cooldown_until: None,
            suppressed: false,
            last_rating_average: 0.0,
            threshold: config.effective_threshold(),
            min_samples: config.min_decision_samples,
            cooldown: config.cooldown(),
        }
    }

    /// Evaluate one cycle
    ///
    /// # Arguments
    /// * `sample_count` - Samples recorded so far in the current second
    /// * `rating_average` - Average rating of the current second
    /// * `now` - Monotonic time of this cycle
    pub fn evaluate(&mut self, sample_count: u64, rating_average: f64, now: Instant) -> HazardState {
        self.last_rating_average = if rating_average.is_finite() {
            rating_average
        } else {
            0.0
        };

        if sample_count > self.min_samples {
            if self.last_rating_average > self.threshold {
                self.transition(CoverState::Warning);
                self.cooldown_until = Some(now + self.cooldown);
            } else if self.state == CoverState::Warning && !self.in_cooldown(now) {
                self.transition(CoverState::Calm);
                self.cooldown_until = None;
            }
        }

        self.state()
    }

    fn transition(&mut self, next: CoverState) {
        if self.state != next {
            tracing::debug!(
                from = ?self.state,
                to = ?next,
                rating = self.last_rating_average,
                suppressed = self.suppressed,
                "cover_transition"
            );
            self.state = next;
        }
    }

    /// Whether the cool-down is still running at `now`
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Computed state, ignoring suppression
    pub fn cover_state(&self) -> CoverState {
        self.state
    }

    /// Current output, with suppression applied
    pub fn state(&self) -> HazardState {
        HazardState {
            show_cover: self.state == CoverState::Warning && !self.suppressed,
            rating_average: self.last_rating_average,
            display_value: self.last_rating_average * DISPLAY_SCALE,
            suppressed: self.suppressed,
        }
    }

    /// Set or clear the user override
    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    /// Whether the user override is active
    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Change the rating threshold for subsequent evaluations
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Current rating threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return to Calm and clear the cool-down and the user override
    pub fn reset(&mut self) {
        self.state = CoverState::Calm;
        self.cooldown_until = None;
        self.suppressed = false;
        self.last_rating_average = 0.0;
    }
}
