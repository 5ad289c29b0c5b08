//! Per-second timeline of luminance and rating statistics
//!
//! Samples are bucketed by `floor(playback_time)`. Buckets live in a sparse
//! map keyed by second, so a jump far into a long stream costs one entry;
//! seconds that were skipped (by a seek, or because playback started
//! mid-video) have no bucket and are reported as "no data". The whole
//! timeline is cleared only on a session reset.

use super::counter::VarianceCounter;
use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Highest playback second the timeline will track (one week)
pub const MAX_TIMELINE_SECONDS: u64 = 7 * 24 * 3600;

/// Statistics of one playback second
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecondStats {
    /// Average frame luminance samples
    pub luminance: VarianceCounter,
    /// Rating samples
    pub rating: VarianceCounter,
}

impl SecondStats {
    /// Number of cycles recorded in this second
    pub fn sample_count(&self) -> u64 {
        self.rating.count()
    }

    /// Rating average, `None` before the first sample
    pub fn rating_average(&self) -> Option<f64> {
        self.rating.average().ok()
    }
}

/// One row of a timeline snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// Playback second
    pub second: u64,
    /// Average rating, `None` when the second was never recorded
    pub rating_average: Option<f64>,
    /// Number of samples recorded in this second
    pub sample_count: u64,
}

/// Risk classification of a second, as drawn on the risk bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    /// Unrecorded, or too few samples to judge
    NoData,
    /// Rating average at or below the threshold
    Safe,
    /// Rating average above the threshold
    Hazardous,
}

/// Identity and start time of the current analysis session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    /// Content identity reported by the environment, if any
    pub identity: Option<String>,
    /// When the session started
    pub started_at: DateTime<Utc>,
}

impl SessionInfo {
    fn new(identity: Option<String>) -> Self {
        Self {
            identity,
            started_at: Utc::now(),
        }
    }
}

/// Snapshot handed to the risk-map renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    /// Session the entries belong to
    pub session: SessionInfo,
    /// One entry per second from 0 to the last recorded second
    pub entries: Vec<TimelineEntry>,
}

/// Sparse, second-indexed statistics for one session
#[derive(Debug)]
pub struct Timeline {
    seconds: BTreeMap<u64, SecondStats>,
    /// Length of the content in whole seconds, when known
    expected_seconds: Option<u64>,
    session: SessionInfo,
}

impl Timeline {
    /// Create an empty timeline for an anonymous session
    pub fn new() -> Self {
        Self {
            seconds: BTreeMap::new(),
            expected_seconds: None,
            session: SessionInfo::new(None),
        }
    }

    /// Remember the length of the content being analyzed
    ///
    /// The risk map then spans the whole content even before playback gets
    /// there. Non-finite or negative durations are ignored.
    pub fn set_expected_duration(&mut self, duration_secs: f64) {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return;
        }
        self.expected_seconds = Some((duration_secs.ceil() as u64).min(MAX_TIMELINE_SECONDS + 1));
    }

    /// Length of the content in whole seconds, when known
    pub fn expected_seconds(&self) -> Option<u64> {
        self.expected_seconds
    }

    /// Record one cycle's luminance and rating into `second`
    ///
    /// Returns false when the second is beyond [`MAX_TIMELINE_SECONDS`].
    pub fn record(&mut self, second: u64, luminance: f64, rating: f64) -> bool {
        if second > MAX_TIMELINE_SECONDS {
            tracing::warn!(second, "Playback second beyond timeline range, sample dropped");
            return false;
        }
        let stats = self.seconds.entry(second).or_default();
        stats.luminance.record(luminance);
        stats.rating.record(rating);
        true
    }

    /// Statistics of `second`, if anything was recorded there
    pub fn get(&self, second: u64) -> Option<&SecondStats> {
        self.seconds.get(&second)
    }

    /// Last second that has data
    pub fn max_known_second(&self) -> Option<u64> {
        self.seconds.keys().next_back().copied()
    }

    /// True when nothing has been recorded this session
    pub fn is_empty(&self) -> bool {
        self.max_known_second().is_none()
    }

    /// Number of seconds that have data
    pub fn recorded_seconds(&self) -> usize {
        self.seconds.len()
    }

    /// Current session info
    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// Entries for every second from 0 to the last recorded second
    pub fn entries(&self) -> Vec<TimelineEntry> {
        let Some(max) = self.max_known_second() else {
            return Vec::new();
        };
        (0..=max)
            .map(|second| match self.get(second) {
                Some(stats) => TimelineEntry {
                    second,
                    rating_average: stats.rating_average(),
                    sample_count: stats.sample_count(),
                },
                None => TimelineEntry {
                    second,
                    rating_average: None,
                    sample_count: 0,
                },
            })
            .collect()
    }

    /// Entries together with the session they belong to
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            session: self.session.clone(),
            entries: self.entries(),
        }
    }

    /// Classify every second for the risk bar
    ///
    /// Spans `0..ceil(duration)` when a finite duration is passed, otherwise
    /// the expected length of the content or `0..=max_known_second`,
    /// whichever is longer.
    pub fn risk_map(&self, threshold: f64, min_samples: u64, duration_secs: Option<f64>) -> Vec<RiskLevel> {
        let span = match duration_secs.filter(|d| d.is_finite() && *d > 0.0) {
            Some(d) => (d.ceil() as u64).min(MAX_TIMELINE_SECONDS + 1),
            None => self
                .max_known_second()
                .map_or(0, |m| m + 1)
                .max(self.expected_seconds.unwrap_or(0)),
        };
        (0..span)
            .map(|second| match self.get(second) {
                Some(stats) if stats.sample_count() >= min_samples => {
                    match stats.rating_average() {
                        Some(avg) if avg > threshold => RiskLevel::Hazardous,
                        Some(_) => RiskLevel::Safe,
                        None => RiskLevel::NoData,
                    }
                }
                _ => RiskLevel::NoData,
            })
            .collect()
    }

    /// Clear every second and start a new anonymous session
    pub fn reset(&mut self) {
        self.reset_for(None);
    }

    /// Clear every second and start a session for `identity`
    pub fn reset_for(&mut self, identity: Option<String>) {
        self.seconds.clear();
        self.expected_seconds = None;
        self.session = SessionInfo::new(identity);
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
