//! Analysis orchestrator
//!
//! Drives one selection from click to rendered results: loading panel,
//! cosmetic progress, the analysis request, and the hand-off to the
//! renderer and the light-cycle simulator.
//!
//! Every selection owns a generation number. Timers and responses belonging
//! to an older generation are dropped instead of being drawn over the newer
//! selection.

use crate::metrics::Metrics;
use crate::models::dashboard_state::PULSE_DOT_COUNT;
use crate::models::{AnalysisResult, AnimationSettings, ErrorPanel, ImageRef, ResultsPanel, TimingDisplay, VisualizationPanel};
use crate::services::api::{ApiError, TrafficApi};
use crate::services::light_cycle::LightCycleSlot;
use crate::services::render::{ResultRenderer, decode_image};
use crate::state::StateManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Shown when a failure carries no message of its own
pub const ANALYSIS_ERROR_FALLBACK: &str = "Failed to analyze the image. Please try again.";

/// How a call to [`AnalysisOrchestrator::select_image`] ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Results were rendered
    Completed,
    /// The error panel was rendered with this message
    Failed(String),
    /// A newer selection was made before the response arrived
    Superseded,
}

/// Aborts the wrapped task when dropped
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Clone)]
pub struct AnalysisOrchestrator {
    state: Arc<StateManager>,
    api: Arc<dyn TrafficApi>,
    settings: AnimationSettings,
    metrics: Arc<Metrics>,
    light_cycle: Arc<LightCycleSlot>,
}

impl AnalysisOrchestrator {
    pub fn new(
        state: Arc<StateManager>,
        api: Arc<dyn TrafficApi>,
        settings: AnimationSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state,
            api,
            settings,
            metrics,
            light_cycle: Arc::new(LightCycleSlot::new()),
        }
    }

    /// The slot holding the running light-cycle simulation
    pub fn light_cycle(&self) -> &Arc<LightCycleSlot> {
        &self.light_cycle
    }

    /// Analyze `image` and render the outcome
    ///
    /// Renders the loading panel synchronously, issues exactly one analysis
    /// request, then renders results or the error panel. Follow-up work
    /// (fade-in, simulation start) is scheduled on the runtime and skipped if
    /// another selection happens first.
    pub async fn select_image(&self, image: ImageRef) -> AnalysisOutcome {
        let generation = self.state.begin_selection(image.clone());
        tracing::info!("Analyzing {} (selection #{})", image, generation);

        self.spawn_preview_fetch(&image);
        self.spawn_progress(generation, self.settings.first_progress_delay(), 1, 40);
        self.spawn_progress(generation, self.settings.second_progress_delay(), 2, 70);
        let pulse = self.spawn_dot_pulse(generation);

        self.metrics.record_analysis_requested();
        let started = Instant::now();
        let response = self.api.analyze(image.clone()).await;
        drop(pulse);

        match response {
            Ok(result) => self.complete(generation, &image, result, started.elapsed()),
            Err(e) => self.fail(generation, image, e),
        }
    }

    /// Re-run the analysis named by the error panel's retry action
    ///
    /// # Returns
    /// `None` if no error panel is shown
    pub async fn retry(&self) -> Option<AnalysisOutcome> {
        let image = self.state.retry_target()?;
        tracing::info!("Retrying analysis of {}", image);
        Some(self.select_image(image).await)
    }

    /// Stop the light-cycle simulation; used on shutdown
    pub fn stop_simulation(&self) {
        self.light_cycle.stop();
    }

    fn complete(
        &self,
        generation: u64,
        image: &ImageRef,
        result: AnalysisResult,
        elapsed: Duration,
    ) -> AnalysisOutcome {
        // The previous simulation belongs to an older analysis; it must not tick
        // over "Calculating..." while this one waits for its own start.
        if self.state.read(|s| s.is_current(generation)) {
            self.light_cycle.stop();
        }

        let rendered = self.state.update_if_current(generation, |state| {
            if let Some(panel) = state.loading_panel_mut() {
                panel.finish();
            }
            ResultRenderer::render(state, &result);
            state.results_revealed = false;
            state.timing = TimingDisplay::Calculating;
        });

        if rendered.is_none() {
            tracing::debug!("Discarding stale analysis of {} (selection #{})", image, generation);
            self.metrics.record_stale_discarded();
            return AnalysisOutcome::Superseded;
        }

        tracing::info!(
            "Analysis of {} complete in {}ms: {}",
            image,
            elapsed.as_millis(),
            result.prediction
        );
        self.metrics.record_analysis_completed(elapsed);

        self.spawn_fade_in(generation);
        self.spawn_simulation_start(generation, result);
        AnalysisOutcome::Completed
    }

    fn fail(&self, generation: u64, image: ImageRef, error: ApiError) -> AnalysisOutcome {
        let mut message = error.to_string();
        if message.is_empty() {
            message = ANALYSIS_ERROR_FALLBACK.to_string();
        }

        let panel = ErrorPanel {
            message: message.clone(),
            retry: image.clone(),
        };
        // The visualization placeholder stays, frozen on its last dot
        let rendered = self.state.update_if_current(generation, |state| {
            state.results = ResultsPanel::Failed(panel);
        });

        if rendered.is_none() {
            tracing::debug!("Discarding stale failure for {}: {}", image, message);
            self.metrics.record_stale_discarded();
            return AnalysisOutcome::Superseded;
        }

        tracing::error!("Analysis of {} failed: {}", image, error);
        self.metrics.record_analysis_failed();
        AnalysisOutcome::Failed(message)
    }

    /// Load the loading-panel preview when the gallery has no thumbnail for it
    ///
    /// The decoded image is stored as the entry's thumbnail, so the preview and
    /// the gallery share it.
    fn spawn_preview_fetch(&self, image: &ImageRef) {
        let (has_thumbnail, catalog_generation) =
            self.state.read(|s| (s.thumbnails.contains_key(image), s.catalog_generation));
        if has_thumbnail {
            return;
        }

        let state = Arc::clone(&self.state);
        let api = Arc::clone(&self.api);
        let image = image.clone();
        tokio::spawn(async move {
            let decoded = match api.fetch_image(image.clone()).await {
                Ok(bytes) => decode_image(&bytes).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match decoded {
                Ok(preview) => {
                    if !state.add_thumbnail(catalog_generation, image.clone(), preview) {
                        tracing::debug!("Dropping preview of {} for replaced catalog", image);
                    }
                }
                Err(e) => tracing::warn!("Preview unavailable for {}: {}", image, e),
            }
        });
    }

    /// Advance the loading panel after `delay` if it is still on screen
    fn spawn_progress(&self, generation: u64, delay: Duration, step: usize, fill_percent: u8) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let applied = state.update_if_current(generation, |s| {
                if let Some(panel) = s.loading_panel_mut() {
                    panel.advance(step, fill_percent);
                }
            });
            if applied.is_none() {
                tracing::trace!("Progress step {} skipped for stale selection #{}", step, generation);
            }
        });
    }

    /// Cycle the highlighted placeholder dot until the guard is dropped
    fn spawn_dot_pulse(&self, generation: u64) -> TaskGuard {
        let state = Arc::clone(&self.state);
        let period = self.settings.dot_pulse_interval();
        TaskGuard(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let applied = state.update_if_current(generation, |s| {
                    if let VisualizationPanel::Generating { active_dot } = &mut s.visualization {
                        *active_dot = (*active_dot + 1) % PULSE_DOT_COUNT;
                    }
                });
                if applied.is_none() {
                    break;
                }
            }
        }))
    }

    fn spawn_fade_in(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let delay = self.settings.fade_in_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.update_if_current(generation, |s| s.results_revealed = true);
        });
    }

    fn spawn_simulation_start(&self, generation: u64, result: AnalysisResult) {
        let state = Arc::clone(&self.state);
        let metrics = Arc::clone(&self.metrics);
        let slot = Arc::clone(&self.light_cycle);
        let delay = self.settings.simulation_start_delay();
        let period = self.settings.light_tick();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let started =
                slot.replace_if_current(generation, result.timings, period, state, Arc::clone(&metrics));
            if !started {
                tracing::debug!("Skipping light cycle for stale selection #{}", generation);
                metrics.record_stale_discarded();
            }
        });
    }
}
