//! Flashguard - photosensitive flash hazard detection
//!
//! Entry point for the demo runner: plays a synthetic test pattern through
//! the analysis loop and prints every protective-cover change.

use anyhow::Result;
use flashguard::engine::pattern::{Pattern, PatternSource, BLACK, WHITE};
use flashguard::stats::timeline::RiskLevel;
use flashguard::{AnalysisLoop, EngineConfig, HazardState};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Frame rate of the synthetic pattern
const PATTERN_FRAME_RATE: f64 = 30.0;

struct Options {
    config_path: Option<PathBuf>,
    pattern: Pattern,
    seconds: f64,
    dump_timeline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("flashguard=info".parse()?),
        )
        .init();

    let Some(options) = parse_args()? else {
        return Ok(());
    };

    let config = match &options.config_path {
        Some(path) => EngineConfig::load(path),
        None => EngineConfig::default(),
    };

    println!("Flashguard v{} - flash hazard monitor", flashguard::VERSION);
    println!(
        "Pattern: {:?}, {:.1}s at {} fps, threshold {:.3}",
        options.pattern, options.seconds, PATTERN_FRAME_RATE, config.rating_threshold
    );
    println!("Press Ctrl+C to stop.");
    println!("────────────────────────────────────────");

    let source = PatternSource::new(options.pattern, PATTERN_FRAME_RATE).with_duration(options.seconds);
    let handle = AnalysisLoop::spawn(config, source)?;
    handle.notify_identity("test-pattern").await?;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .ok();

    let deadline = tokio::time::Instant::now() + Duration::from_secs_f64(options.seconds + 0.5);
    let mut states = handle.subscribe();
    let mut last_shown = false;

    while running.load(Ordering::SeqCst) && tokio::time::Instant::now() < deadline {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                if state.show_cover != last_shown {
                    print_state(&state);
                    last_shown = state.show_cover;
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
    }

    let snapshot = handle.timeline_snapshot().await?;
    let risk = handle.risk_map().await?;
    handle.shutdown().await?;

    println!("────────────────────────────────────────");
    println!("Risk map: {}", render_risk(&risk));
    if options.dump_timeline {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    info!(seconds = snapshot.entries.len(), "Done");

    Ok(())
}

fn parse_args() -> Result<Option<Options>> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config_path: None,
        pattern: Pattern::strobe(),
        seconds: 5.0,
        dump_timeline: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--version" | "-v" => {
                println!("flashguard {}", flashguard::VERSION);
                return Ok(None);
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--config" | "-c" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                options.config_path = Some(PathBuf::from(value));
                i += 1;
            }
            "--pattern" | "-p" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--pattern requires a name"))?;
                options.pattern = match value.as_str() {
                    "strobe" => Pattern::strobe(),
                    "slow" => Pattern::Alternate {
                        first: BLACK,
                        second: WHITE,
                        hold_frames: 15,
                    },
                    "static" => Pattern::Static(WHITE),
                    other => anyhow::bail!("Unknown pattern: {}", other),
                };
                i += 1;
            }
            "--seconds" | "-s" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--seconds requires a value"))?;
                options.seconds = value
                    .parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .ok_or_else(|| anyhow::anyhow!("Invalid duration: {}", value))?;
                i += 1;
            }
            "--timeline" | "-t" => options.dump_timeline = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                return Ok(None);
            }
        }
        i += 1;
    }

    Ok(Some(options))
}

fn print_help() {
    println!("Usage: flashguard [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config PATH       Load engine config from a JSON file");
    println!("  -p, --pattern NAME      strobe (default), slow or static");
    println!("  -s, --seconds N         Length of the pattern in seconds (default: 5)");
    println!("  -t, --timeline          Print the per-second timeline as JSON");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Set RUST_LOG=flashguard=debug for per-transition logging.");
}

fn print_state(state: &HazardState) {
    let status = if state.show_cover { "COVER" } else { "CLEAR" };
    println!(
        "Status: {:<5} | Rating: {:>8.4} | Display: {:>7.1}",
        status, state.rating_average, state.display_value
    );
}

fn render_risk(risk: &[RiskLevel]) -> String {
    risk.iter()
        .map(|level| match level {
            RiskLevel::NoData => '.',
            RiskLevel::Safe => '-',
            RiskLevel::Hazardous => '#',
        })
        .collect()
}
