//! One analysis cycle
//!
//! Threads a frame through the pipeline:
//!
//! ```text
//! PixelFrame -> LuminanceBuffer -> DeltaBuffer (vs previous) -> rating (vs previous delta)
//!            -> Timeline[floor(playback_time)] -> HazardDecision
//! ```
//!
//! Everything fallible runs before any state is touched, so a cycle that
//! fails leaves the analyzer exactly as it was.

use crate::analysis::hazard::{HazardDecision, HazardState};
use crate::analysis::scorer;
use crate::config::{clamp_threshold, EngineConfig};
use crate::error::AnalysisError;
use crate::frame::delta::{DeltaBuffer, FlashKind};
use crate::frame::luminance::LuminanceBuffer;
use crate::frame::pixel::PixelFrame;
use crate::stats::timeline::{RiskLevel, Timeline, TimelineEntry, TimelineSnapshot};
use std::time::Instant;

/// Debug imagery produced every few cycles
#[derive(Debug, Clone, PartialEq)]
pub struct Visualization {
    /// Bright / dark flash classification of every pixel
    pub flash_mask: Vec<FlashKind>,
    /// Noise-filtered reversal magnitude per pixel, once two deltas exist
    pub transition_map: Option<Vec<f32>>,
}

/// Result of one analysis cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Playback second the sample was recorded into
    pub second: u64,
    /// Mean luminance of the frame
    pub average_luminance: f64,
    /// Oscillation rating of this cycle (0 until two deltas exist)
    pub rating: f64,
    /// Hazard output after this cycle
    pub hazard: HazardState,
    /// Debug imagery, when due this cycle
    pub visualization: Option<Visualization>,
}

/// Map a playback position to its timeline second
///
/// Negative and non-finite positions land in second 0.
pub fn playback_second(playback_time: f64) -> u64 {
    if playback_time.is_finite() && playback_time > 0.0 {
        playback_time.floor() as u64
    } else {
        0
    }
}

/// Owns all state that survives between cycles of one session
#[derive(Debug)]
pub struct FlashAnalyzer {
    config: EngineConfig,
    timeline: Timeline,
    decision: HazardDecision,
    /// Luminance of the previous frame
    previous_luminance: Option<LuminanceBuffer>,
    /// Delta of the previous cycle
    previous_delta: Option<DeltaBuffer>,
    /// Cycles completed this session
    cycle_count: u64,
}

impl FlashAnalyzer {
    /// Create an analyzer with an empty session
    pub fn new(config: EngineConfig) -> Self {
        let config = config.validated();
        let decision = HazardDecision::new(&config);
        Self {
            config,
            timeline: Timeline::new(),
            decision,
            previous_luminance: None,
            previous_delta: None,
            cycle_count: 0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pixels per frame at the analysis resolution
    pub fn pixel_count(&self) -> usize {
        self.config.analysis_width as usize * self.config.analysis_height as usize
    }

    /// Run one cycle
    ///
    /// # Arguments
    /// * `frame` - Frame captured at the analysis resolution
    /// * `playback_time` - Playback position of `frame` in seconds
    /// * `now` - Monotonic time of this cycle, drives the cool-down
    ///
    /// # Errors
    /// `DimensionMismatch` when the frame does not match the analysis
    /// resolution. The analyzer state is unchanged.
    pub fn process_frame(
        &mut self,
        frame: &PixelFrame,
        playback_time: f64,
        now: Instant,
    ) -> Result<CycleReport, AnalysisError> {
        AnalysisError::check_len(self.pixel_count(), frame.pixel_count())?;

        let luminance = LuminanceBuffer::compute(frame);
        let delta = match &self.previous_luminance {
            Some(previous) => Some(DeltaBuffer::compute(previous, &luminance)?),
            None => None,
        };
        let rating = match (&self.previous_delta, &delta) {
            (Some(previous), Some(current)) => scorer::score(previous, current)?,
            _ => 0.0,
        };
        let visualization = if self.visualization_due() {
            self.visualize(delta.as_ref())?
        } else {
            None
        };

        self.cycle_count += 1;
        let second = playback_second(playback_time);
        let average_luminance = luminance.mean();
        self.timeline.record(second, average_luminance, rating);

        let (sample_count, rating_average) = self
            .timeline
            .get(second)
            .map(|stats| (stats.sample_count(), stats.rating_average().unwrap_or(0.0)))
            .unwrap_or((0, 0.0));
        let hazard = self.decision.evaluate(sample_count, rating_average, now);

        self.previous_luminance = Some(luminance);
        self.previous_delta = delta;

        tracing::trace!(
            cycle = self.cycle_count,
            second,
            luminance = average_luminance,
            rating,
            samples = sample_count,
            show_cover = hazard.show_cover,
            "cycle"
        );

        Ok(CycleReport {
            second,
            average_luminance,
            rating,
            hazard,
            visualization,
        })
    }

    fn visualization_due(&self) -> bool {
        let interval = self.config.visualization_interval as u64;
        interval > 0 && (self.cycle_count + 1) % interval == 0
    }

    fn visualize(&self, delta: Option<&DeltaBuffer>) -> Result<Option<Visualization>, AnalysisError> {
        let Some(delta) = delta else {
            return Ok(None);
        };
        let transition_map = match &self.previous_delta {
            Some(previous) => Some(scorer::transition_map(previous, delta)?),
            None => None,
        };
        tracing::debug!(cycle = self.cycle_count + 1, "visualization_snapshot");
        Ok(Some(Visualization {
            flash_mask: delta.flash_mask(),
            transition_map,
        }))
    }

    /// Current hazard output
    pub fn hazard_state(&self) -> HazardState {
        self.decision.state()
    }

    /// Session statistics
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// `(second, rating average or no data, sample count)` from second 0 on
    pub fn timeline_entries(&self) -> Vec<TimelineEntry> {
        self.timeline.entries()
    }

    /// Entries plus session info
    pub fn timeline_snapshot(&self) -> TimelineSnapshot {
        self.timeline.snapshot()
    }

    /// Risk bar classification with the active threshold
    pub fn risk_map(&self, duration_secs: Option<f64>) -> Vec<RiskLevel> {
        self.timeline.risk_map(
            self.decision.threshold(),
            self.config.risk_min_samples,
            duration_secs,
        )
    }

    /// Tell the timeline how long the content is
    pub fn set_expected_duration(&mut self, duration_secs: f64) {
        self.timeline.set_expected_duration(duration_secs);
    }

    /// Set or clear the user override for this session
    pub fn set_user_suppression(&mut self, suppressed: bool) {
        tracing::info!(suppressed, "User suppression changed");
        self.decision.set_suppressed(suppressed);
    }

    /// Change the rating threshold, clamped into the documented range
    pub fn set_rating_threshold(&mut self, threshold: f64) {
        let applied = clamp_threshold(threshold);
        if applied != threshold {
            tracing::warn!(requested = threshold, applied, "Rating threshold out of range, clamping");
        }
        self.config.rating_threshold = applied;
        self.decision.set_threshold(applied);
    }

    /// Forget the retained frame and delta
    ///
    /// Called when playback jumps, so no delta is computed across the gap.
    pub fn mark_discontinuity(&mut self) {
        self.previous_luminance = None;
        self.previous_delta = None;
    }

    /// Start a new anonymous session
    pub fn reset_session(&mut self) {
        self.reset_for_identity(None);
    }

    /// Start a new session for `identity`
    ///
    /// Clears the timeline, the hazard state, the user override and the
    /// retained buffers together.
    pub fn reset_for_identity(&mut self, identity: Option<String>) {
        tracing::info!(identity = ?identity, cycles = self.cycle_count, "Session reset");
        self.timeline.reset_for(identity);
        self.decision.reset();
        self.mark_discontinuity();
        self.cycle_count = 0;
    }

    /// Cycles completed this session
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
