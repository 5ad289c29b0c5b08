//! E2E tests for the per-second timeline and the risk map
//!
//! Verifies bucketing by playback second, "no data" gaps left by seeks,
//! and the risk classification shown to the user.

use approx::assert_relative_eq;
use flashguard::engine::pattern::{Pattern, BLACK, WHITE};
use flashguard::stats::counter::VarianceCounter;
use flashguard::stats::timeline::RiskLevel;
use flashguard::{EngineConfig, FlashAnalyzer, PixelFrame, Timeline};
use std::time::Instant;

fn small_config() -> EngineConfig {
    EngineConfig {
        analysis_width: 16,
        analysis_height: 9,
        ..Default::default()
    }
}

fn feed(analyzer: &mut FlashAnalyzer, pattern: Pattern, frames: std::ops::Range<u64>) {
    let now = Instant::now();
    for i in frames {
        let frame = PixelFrame::filled(16, 9, pattern.color_at(i));
        analyzer.process_frame(&frame, i as f64 / 30.0, now).unwrap();
    }
}

/// VarianceCounter follows the documented worked example
#[test]
fn test_counter_worked_example() {
    let mut counter = VarianceCounter::new();
    for value in [1.0, 3.0, 2.0] {
        counter.record(value);
    }
    assert_eq!(counter.count(), 3);
    assert_relative_eq!(counter.average().unwrap(), 2.0);
    assert_relative_eq!(counter.variance_accumulator(), 5.0);
    assert_relative_eq!(counter.dispersion().unwrap(), 5.0 / 3.0);
}

/// Samples land in the bucket of their playback second
#[test]
fn test_samples_bucket_by_second() {
    let mut analyzer = FlashAnalyzer::new(small_config());
    feed(&mut analyzer, Pattern::Static(WHITE), 0..75);

    let entries = analyzer.timeline_entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].sample_count, 30);
    assert_eq!(entries[1].sample_count, 30);
    assert_eq!(entries[2].sample_count, 15);
}

/// Seeking forward leaves the skipped seconds without data
#[test]
fn test_seek_leaves_gaps() {
    let mut analyzer = FlashAnalyzer::new(small_config());
    feed(&mut analyzer, Pattern::strobe(), 0..30);
    analyzer.mark_discontinuity();
    feed(&mut analyzer, Pattern::strobe(), 120..150);

    let entries = analyzer.timeline_entries();
    assert_eq!(entries.len(), 5);
    for entry in &entries[1..4] {
        assert_eq!(entry.rating_average, None);
        assert_eq!(entry.sample_count, 0);
    }
    // The jump does not produce a reversal of its own
    let second_four = analyzer.timeline().get(4).unwrap();
    assert_relative_eq!(second_four.rating_average().unwrap(), 2.0 * 28.0 / 30.0);
}

/// The risk map marks strobing seconds, calm seconds and gaps
#[test]
fn test_risk_map_classification() {
    let mut analyzer = FlashAnalyzer::new(small_config());
    feed(&mut analyzer, Pattern::Static(BLACK), 0..30);
    feed(&mut analyzer, Pattern::strobe(), 30..60);
    analyzer.mark_discontinuity();
    // Only three samples in second 3
    feed(&mut analyzer, Pattern::Static(BLACK), 90..93);

    let map = analyzer.risk_map(Some(5.0));
    assert_eq!(
        map,
        vec![
            RiskLevel::Safe,
            RiskLevel::Hazardous,
            RiskLevel::NoData,
            RiskLevel::NoData,
            RiskLevel::NoData,
        ]
    );

    // Without a known duration the map ends at the last recorded second
    assert_eq!(analyzer.risk_map(None).len(), 4);
}

/// Raising the threshold reclassifies the same data
#[test]
fn test_risk_map_follows_threshold() {
    let mut timeline = Timeline::new();
    for _ in 0..10 {
        timeline.record(0, 0.5, 0.1);
    }
    assert_eq!(timeline.risk_map(0.06, 5, None), vec![RiskLevel::Hazardous]);
    assert_eq!(timeline.risk_map(0.2, 5, None), vec![RiskLevel::Safe]);
}

/// Snapshots serialize for the presentation layer
#[test]
fn test_snapshot_serializes() {
    let mut analyzer = FlashAnalyzer::new(small_config());
    analyzer.reset_for_identity(Some("clip-42".to_string()));
    feed(&mut analyzer, Pattern::Static(WHITE), 0..3);

    let json = serde_json::to_value(analyzer.timeline_snapshot()).unwrap();
    assert_eq!(json["session"]["identity"], "clip-42");
    assert_eq!(json["entries"][0]["second"], 0);
    assert_eq!(json["entries"][0]["sample_count"], 3);
    assert_eq!(json["entries"][0]["rating_average"], 0.0);
}
