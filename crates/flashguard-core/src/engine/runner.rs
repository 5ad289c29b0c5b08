//! Analysis loop and its control handle
//!
//! The loop owns the analyzer and the frame source outright. Everything else
//! talks to it through an [`AnalysisHandle`]: commands go in over an mpsc
//! mailbox (queries carry a oneshot reply), and the hazard output and the
//! latest debug visualization come back over watch channels. Commands are always drained before the next cycle
//! runs, so a reset or an override takes effect at a cycle boundary and never
//! halfway through one.

use super::analyzer::{FlashAnalyzer, Visualization};
use super::source::{FrameSource, SourceEvent};
use crate::analysis::hazard::HazardState;
use crate::config::EngineConfig;
use crate::stats::timeline::{RiskLevel, TimelineSnapshot};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

/// Mailbox depth of the analysis loop
const COMMAND_CAPACITY: usize = 32;

/// Commands sent to the analysis loop
#[derive(Debug)]
pub enum LoopCommand {
    /// Playback notification from the environment
    Source(SourceEvent),
    /// The content being played changed
    IdentityChanged(String),
    /// Start a new session for the current content
    ResetSession,
    /// Set or clear the user override
    SetSuppression(bool),
    /// Change the rating threshold
    SetThreshold(f64),
    /// Current hazard output
    GetHazardState {
        reply: oneshot::Sender<HazardState>,
    },
    /// Per-second statistics of the session
    GetTimeline {
        reply: oneshot::Sender<TimelineSnapshot>,
    },
    /// Risk bar classification over the content
    GetRiskMap {
        reply: oneshot::Sender<Vec<RiskLevel>>,
    },
    /// Stop the loop
    Shutdown,
}

/// Periodic analysis driver
///
/// # Example
/// ```no_run
/// use flashguard_core::engine::pattern::{Pattern, PatternSource};
/// use flashguard_core::{AnalysisLoop, EngineConfig};
///
/// # fn main() -> anyhow::Result<()> {
/// let source = PatternSource::new(Pattern::strobe(), 30.0);
/// let handle = AnalysisLoop::spawn(EngineConfig::default(), source)?;
/// let mut states = handle.subscribe();
/// # let _ = &mut states;
/// # Ok(())
/// # }
/// ```
pub struct AnalysisLoop<S: FrameSource> {
    analyzer: FlashAnalyzer,
    source: S,
    rx: mpsc::Receiver<LoopCommand>,
    state_tx: watch::Sender<HazardState>,
    visualization_tx: watch::Sender<Option<Arc<Visualization>>>,
    /// Whether cycles are currently scheduled
    running: bool,
    /// Identity of the content the session belongs to
    identity: Option<String>,
    /// Cycles skipped because no frame could be analyzed
    skipped_cycles: u64,
}

impl<S: FrameSource + 'static> AnalysisLoop<S> {
    /// Build a loop and the handle that controls it
    ///
    /// The loop does nothing until [`run`](Self::run) is polled.
    pub fn new(config: EngineConfig, source: S) -> (Self, AnalysisHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(HazardState::default());
        let (visualization_tx, visualization_rx) = watch::channel(None);
        let running = source.is_playing();

        let mut analyzer = FlashAnalyzer::new(config);
        if let Some(duration) = source.duration() {
            analyzer.set_expected_duration(duration);
        }

        let analysis_loop = Self {
            analyzer,
            source,
            rx,
            state_tx,
            visualization_tx,
            running,
            identity: None,
            skipped_cycles: 0,
        };
        let handle = AnalysisHandle {
            tx,
            state_rx,
            visualization_rx,
        };
        (analysis_loop, handle)
    }

    /// Run the loop on a dedicated thread with its own runtime
    pub fn spawn(config: EngineConfig, source: S) -> anyhow::Result<AnalysisHandle> {
        let (analysis_loop, handle) = Self::new(config, source);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        std::thread::Builder::new()
            .name("flashguard-analysis".to_string())
            .spawn(move || runtime.block_on(analysis_loop.run()))?;

        Ok(handle)
    }

    /// Drive cycles and commands until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        let interval = self.analyzer.config().cycle_interval();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = interval.as_millis() as u64,
            width = self.analyzer.config().analysis_width,
            height = self.analyzer.config().analysis_height,
            threshold = self.analyzer.config().rating_threshold,
            "Analysis loop started"
        );

        loop {
            tokio::select! {
                biased;
                command = self.rx.recv() => match command {
                    Some(LoopCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = ticker.tick(), if self.running => self.cycle(Instant::now()),
            }
        }

        tracing::info!(
            cycles = self.analyzer.cycle_count(),
            skipped = self.skipped_cycles,
            "Analysis loop stopped"
        );
    }

    fn cycle(&mut self, now: Instant) {
        if !self.source.is_playing() {
            tracing::debug!("Playback not advancing, analysis idle");
            self.running = false;
            return;
        }

        let config = self.analyzer.config();
        let (width, height) = (config.analysis_width, config.analysis_height);
        let frame = match self.source.current_frame(width, height) {
            Ok(frame) => frame,
            Err(e) => {
                self.skipped_cycles += 1;
                tracing::warn!(error = %e, "Frame capture failed, skipping cycle");
                return;
            }
        };

        let playback_time = self.source.playback_time();
        match self.analyzer.process_frame(&frame, playback_time, now) {
            Ok(report) => {
                self.publish(report.hazard);
                if let Some(visualization) = report.visualization {
                    self.visualization_tx.send_replace(Some(Arc::new(visualization)));
                }
            }
            Err(e) => {
                self.skipped_cycles += 1;
                tracing::warn!(error = %e, playback_time, "Analysis cycle failed, skipping");
            }
        }
    }

    fn publish(&self, state: HazardState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            if current.show_cover != state.show_cover {
                tracing::info!(
                    show_cover = state.show_cover,
                    rating = state.rating_average,
                    display_value = state.display_value,
                    "Protective cover changed"
                );
            }
            *current = state;
            true
        });
    }

    fn handle_command(&mut self, command: LoopCommand) {
        match command {
            LoopCommand::Source(event) => self.handle_source_event(event),
            LoopCommand::IdentityChanged(identity) => {
                if self.identity.as_deref() != Some(identity.as_str()) {
                    tracing::info!(identity = %identity, "Content changed, starting new session");
                    self.identity = Some(identity);
                    self.start_session();
                }
            }
            LoopCommand::ResetSession => self.start_session(),
            LoopCommand::SetSuppression(suppressed) => {
                self.analyzer.set_user_suppression(suppressed);
                self.publish(self.analyzer.hazard_state());
            }
            LoopCommand::SetThreshold(threshold) => {
                self.analyzer.set_rating_threshold(threshold);
            }
            LoopCommand::GetHazardState { reply } => {
                let _ = reply.send(self.analyzer.hazard_state());
            }
            LoopCommand::GetTimeline { reply } => {
                let _ = reply.send(self.analyzer.timeline_snapshot());
            }
            LoopCommand::GetRiskMap { reply } => {
                let _ = reply.send(self.analyzer.risk_map(self.source.duration()));
            }
            LoopCommand::Shutdown => {}
        }
    }

    fn start_session(&mut self) {
        self.analyzer.reset_for_identity(self.identity.clone());
        if let Some(duration) = self.source.duration() {
            self.analyzer.set_expected_duration(duration);
        }
        self.publish(self.analyzer.hazard_state());
        self.visualization_tx.send_replace(None);
    }

    fn handle_source_event(&mut self, event: SourceEvent) {
        tracing::debug!(?event, "Playback event");
        if event.starts_analysis() {
            if let Some(duration) = self.source.duration() {
                self.analyzer.set_expected_duration(duration);
            }
            if event == SourceEvent::Seek {
                self.analyzer.mark_discontinuity();
            }
            self.running = true;
        } else {
            self.running = false;
        }
    }
}

/// Handle to communicate with the analysis loop
#[derive(Debug, Clone)]
pub struct AnalysisHandle {
    tx: mpsc::Sender<LoopCommand>,
    state_rx: watch::Receiver<HazardState>,
    visualization_rx: watch::Receiver<Option<Arc<Visualization>>>,
}

impl AnalysisHandle {
    async fn send(&self, command: LoopCommand) -> anyhow::Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("Analysis loop stopped"))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> LoopCommand,
    ) -> anyhow::Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply)).await?;
        rx.await.map_err(|_| anyhow::anyhow!("Analysis loop stopped"))
    }

    /// Receiver that sees every hazard state change
    pub fn subscribe(&self) -> watch::Receiver<HazardState> {
        self.state_rx.clone()
    }

    /// Last published hazard state, without a round trip
    pub fn latest(&self) -> HazardState {
        *self.state_rx.borrow()
    }

    /// Receiver that sees every debug visualization the loop produces
    ///
    /// Holds `None` until the first one, and again after a session reset.
    pub fn subscribe_visualization(&self) -> watch::Receiver<Option<Arc<Visualization>>> {
        self.visualization_rx.clone()
    }

    /// Most recent debug visualization, if any
    pub fn latest_visualization(&self) -> Option<Arc<Visualization>> {
        self.visualization_rx.borrow().clone()
    }

    /// Hazard output as of the last completed cycle
    pub async fn hazard_state(&self) -> anyhow::Result<HazardState> {
        self.request(|reply| LoopCommand::GetHazardState { reply })
            .await
    }

    /// Per-second statistics of the current session
    pub async fn timeline_snapshot(&self) -> anyhow::Result<TimelineSnapshot> {
        self.request(|reply| LoopCommand::GetTimeline { reply })
            .await
    }

    /// Risk bar classification, spanning the content when its length is known
    pub async fn risk_map(&self) -> anyhow::Result<Vec<RiskLevel>> {
        self.request(|reply| LoopCommand::GetRiskMap { reply })
            .await
    }

    /// Dismiss (or restore) the cover for the rest of the session
    pub async fn set_user_suppression(&self, suppressed: bool) -> anyhow::Result<()> {
        self.send(LoopCommand::SetSuppression(suppressed)).await
    }

    /// Clear all statistics, the hazard state and the override
    pub async fn reset_session(&self) -> anyhow::Result<()> {
        self.send(LoopCommand::ResetSession).await
    }

    /// Forward a playback event
    pub async fn notify(&self, event: SourceEvent) -> anyhow::Result<()> {
        self.send(LoopCommand::Source(event)).await
    }

    /// Report the identity of the content now playing
    ///
    /// A different identity from the last one starts a new session.
    pub async fn notify_identity(&self, identity: impl Into<String>) -> anyhow::Result<()> {
        self.send(LoopCommand::IdentityChanged(identity.into())).await
    }

    /// Change the rating threshold (clamped into range by the loop)
    pub async fn set_threshold(&self, threshold: f64) -> anyhow::Result<()> {
        self.send(LoopCommand::SetThreshold(threshold)).await
    }

    /// Stop the loop; every later call on any handle fails
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.send(LoopCommand::Shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pattern::{Pattern, PatternSource, WHITE};
    use std::time::Duration;

    fn fast_config() -> EngineConfig {
        EngineConfig {
            analysis_width: 8,
            analysis_height: 6,
            cycle_interval_ms: 1,
            ..Default::default()
        }
    }

    fn start(source: PatternSource) -> AnalysisHandle {
        let (analysis_loop, handle) = AnalysisLoop::new(fast_config(), source);
        tokio::spawn(analysis_loop.run());
        handle
    }

    async fn wait_for_samples(handle: &AnalysisHandle, second: u64, samples: u64) -> TimelineSnapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = handle.timeline_snapshot().await.unwrap();
                let reached = snapshot
                    .entries
                    .get(second as usize)
                    .is_some_and(|e| e.sample_count >= samples);
                if reached {
                    return snapshot;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("timeline never filled")
    }

    #[tokio::test]
    async fn test_strobe_shows_cover() {
        let handle = start(PatternSource::new(Pattern::strobe(), 30.0));
        let mut states = handle.subscribe();

        let state = *tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| s.show_cover))
            .await
            .expect("cover never shown")
            .unwrap();
        assert!(state.rating_average > 0.06);
        assert!(handle.latest().show_cover);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_suppression_and_reset() {
        let source = PatternSource::new(Pattern::strobe(), 30.0);
        let control = source.control();
        let handle = start(source);
        let mut states = handle.subscribe();

        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| s.show_cover))
            .await
            .expect("cover never shown")
            .unwrap();

        handle.set_user_suppression(true).await.unwrap();
        let state = handle.hazard_state().await.unwrap();
        assert!(!state.show_cover);
        assert!(state.suppressed);

        control.pause();
        handle.notify(SourceEvent::Pause).await.unwrap();
        handle.reset_session().await.unwrap();

        assert_eq!(handle.hazard_state().await.unwrap(), HazardState::default());
        assert!(handle.timeline_snapshot().await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_end_of_content() {
        let source = PatternSource::new(Pattern::Static(WHITE), 30.0).with_duration(1.0);
        let handle = start(source);

        let snapshot = wait_for_samples(&handle, 0, 30).await;
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].sample_count, 30);
        assert_eq!(snapshot.entries[0].rating_average, Some(0.0));

        let risk = handle.risk_map().await.unwrap();
        assert_eq!(risk, vec![RiskLevel::Safe]);
    }

    #[tokio::test]
    async fn test_seek_records_new_second() {
        let source = PatternSource::new(Pattern::Static(WHITE), 30.0);
        let control = source.control();
        control.pause();
        let handle = start(source);

        control.seek_to_frame(150);
        control.play();
        handle.notify(SourceEvent::Seek).await.unwrap();

        let snapshot = wait_for_samples(&handle, 5, 3).await;
        assert!(snapshot.entries[..5]
            .iter()
            .all(|e| e.rating_average.is_none() && e.sample_count == 0));
        assert_eq!(snapshot.entries[5].rating_average, Some(0.0));
    }

    #[tokio::test]
    async fn test_identity_change_starts_session() {
        let source = PatternSource::new(Pattern::Static(WHITE), 30.0);
        let control = source.control();
        control.pause();
        let handle = start(source);

        handle.notify_identity("clip-1").await.unwrap();
        let snapshot = handle.timeline_snapshot().await.unwrap();
        assert_eq!(snapshot.session.identity.as_deref(), Some("clip-1"));
        let started = snapshot.session.started_at;

        // Same identity again keeps the session
        handle.notify_identity("clip-1").await.unwrap();
        let snapshot = handle.timeline_snapshot().await.unwrap();
        assert_eq!(snapshot.session.started_at, started);
    }

    #[tokio::test]
    async fn test_publishes_visualization_until_reset() {
        let source = PatternSource::new(Pattern::strobe(), 30.0);
        let control = source.control();
        let (analysis_loop, handle) = AnalysisLoop::new(
            EngineConfig {
                visualization_interval: 3,
                ..fast_config()
            },
            source,
        );
        tokio::spawn(analysis_loop.run());
        assert!(handle.latest_visualization().is_none());

        let mut visualizations = handle.subscribe_visualization();
        let visualization = tokio::time::timeout(
            Duration::from_secs(5),
            visualizations.wait_for(|v| v.as_ref().is_some_and(|v| v.transition_map.is_some())),
        )
        .await
        .expect("no visualization published")
        .unwrap()
        .clone()
        .unwrap();
        assert_eq!(visualization.flash_mask.len(), 48);
        assert_eq!(visualization.transition_map.as_ref().unwrap(), &vec![2.0; 48]);

        control.pause();
        handle.notify(SourceEvent::Pause).await.unwrap();
        handle.reset_session().await.unwrap();
        handle.hazard_state().await.unwrap();
        assert!(handle.latest_visualization().is_none());
    }

    #[tokio::test]
    async fn test_handle_errors_after_shutdown() {
        let handle = start(PatternSource::new(Pattern::Static(WHITE), 30.0));
        handle.shutdown().await.unwrap();
        assert!(handle.hazard_state().await.is_err());
    }
}
