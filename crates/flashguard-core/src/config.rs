//! Engine configuration
//!
//! Only `rating_threshold` is meant as a user-facing knob; the remaining
//! fields pin down the engine's timing and sampling parameters. Configuration
//! is read from JSON, missing fields take their defaults, and no analysis
//! state is ever written back.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_rating_threshold() -> f64 {
    crate::DEFAULT_RATING_THRESHOLD
}

fn default_analysis_width() -> u32 {
    crate::ANALYSIS_WIDTH
}

fn default_analysis_height() -> u32 {
    crate::ANALYSIS_HEIGHT
}

fn default_min_decision_samples() -> u64 {
    10
}

fn default_cooldown_ms() -> u64 {
    1000
}

fn default_cycle_interval_ms() -> u64 {
    1000 / crate::NOMINAL_FRAME_RATE as u64
}

fn default_risk_min_samples() -> u64 {
    5
}

fn default_visualization_interval() -> u32 {
    10
}

/// Tunable engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Average rating above which a second counts as hazardous, in [0, 0.3]
    #[serde(default = "default_rating_threshold")]
    pub rating_threshold: f64,
    /// Width frames are captured at, regardless of native video size
    #[serde(default = "default_analysis_width")]
    pub analysis_width: u32,
    /// Height frames are captured at
    #[serde(default = "default_analysis_height")]
    pub analysis_height: u32,
    /// A second needs more samples than this before the decision acts on it
    #[serde(default = "default_min_decision_samples")]
    pub min_decision_samples: u64,
    /// Minimum time the cover stays up after the last trigger
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Delay between analysis cycles
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,
    /// Seconds with fewer samples are shown as "no data" in the risk map
    #[serde(default = "default_risk_min_samples")]
    pub risk_min_samples: u64,
    /// Emit a debug visualization every N cycles (0 = never)
    #[serde(default = "default_visualization_interval")]
    pub visualization_interval: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rating_threshold: default_rating_threshold(),
            analysis_width: default_analysis_width(),
            analysis_height: default_analysis_height(),
            min_decision_samples: default_min_decision_samples(),
            cooldown_ms: default_cooldown_ms(),
            cycle_interval_ms: default_cycle_interval_ms(),
            risk_min_samples: default_risk_min_samples(),
            visualization_interval: default_visualization_interval(),
        }
    }
}

impl EngineConfig {
    /// Rating threshold clamped into the documented range (NaN falls back to the default)
    pub fn effective_threshold(&self) -> f64 {
        clamp_threshold(self.rating_threshold)
    }

    /// Cool-down as a duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Cycle cadence as a duration (never zero)
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms.max(1))
    }

    /// Pull out-of-range values back into range, logging each correction
    pub fn validated(mut self) -> Self {
        let threshold = self.effective_threshold();
        if threshold != self.rating_threshold {
            tracing::warn!(
                requested = self.rating_threshold,
                applied = threshold,
                "Rating threshold out of range, clamping"
            );
            self.rating_threshold = threshold;
        }
        if self.cycle_interval_ms == 0 {
            tracing::warn!("Cycle interval of 0 ms requested, using 1 ms");
            self.cycle_interval_ms = 1;
        }
        self
    }

    /// Load config from disk, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<EngineConfig>(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config.validated()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }
}

/// Clamp a rating threshold into [0, MAX_RATING_THRESHOLD]
pub fn clamp_threshold(value: f64) -> f64 {
    if value.is_nan() {
        crate::DEFAULT_RATING_THRESHOLD
    } else {
        value.clamp(0.0, crate::MAX_RATING_THRESHOLD)
    }
}
