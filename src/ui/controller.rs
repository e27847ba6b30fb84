// GUI Controller - Bridges the Slint window with the dashboard services
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - StateManager (dashboard state)
// - ImageLister / AnalysisOrchestrator (behaviour)
// - EventLoopBridge (async/GUI coordination)
//
// It handles:
// - Setting up UI callbacks → async tasks
// - Subscribing to state changes → UI updates

use crate::metrics::Metrics;
use crate::models::dashboard_state::LOADING_STEPS;
use crate::models::{DecodedImage, ImageRef};
use crate::services::{AnalysisOrchestrator, ImageLister};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::{EventLoopBridge, EventLoopBridgeHandle};
use crate::ui::view::{
    self, GalleryPresentation, ResultsPresentation, TimingPresentation, VisualizationPresentation,
};
use anyhow::{Context, Result};
use slint::{ModelRc, Rgba8Pixel, SharedPixelBuffer, SharedString, VecModel};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

// Include the generated Slint code
slint::include_modules!();

/// GUI Controller that wires up the Slint window with dashboard state and services
///
/// # Example
/// ```ignore
/// let controller = GuiController::new(
///     state_manager,
///     lister,
///     orchestrator,
///     metrics,
///     runtime.handle().clone(),
/// )?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge for coordinating between tokio and Slint
    bridge: EventLoopBridge<MainWindow>,

    lister: ImageLister,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `state_manager` - Shared dashboard state
    /// * `lister` - Catalog loader run once the window starts
    /// * `orchestrator` - Analysis flow triggered by gallery clicks and retries
    /// * `metrics` - Counters for UI update traffic
    /// * `tokio_handle` - Handle to the tokio runtime for spawning async tasks
    pub fn new(
        state_manager: Arc<StateManager>,
        lister: ImageLister,
        orchestrator: AnalysisOrchestrator,
        metrics: Arc<Metrics>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        let bridge = EventLoopBridge::new(&ui, tokio_handle, metrics);

        let steps: Vec<SharedString> = LOADING_STEPS.iter().map(|step| SharedString::from(*step)).collect();
        ui.set_loading_steps(ModelRc::new(VecModel::from(steps)));

        Self::sync_ui_with_state(&ui, &state_manager);
        Self::setup_callbacks(&ui, &bridge, &orchestrator);
        Self::setup_state_subscription(&bridge, &state_manager);

        tracing::info!("GUI controller initialized");

        Ok(Self { ui, bridge, lister })
    }

    /// Run the GUI (blocks until window is closed)
    ///
    /// The image catalog is requested as soon as the event loop starts.
    pub fn run(self) -> Result<(), slint::PlatformError> {
        let lister = self.lister.clone();
        self.bridge.spawn_async(move || async move {
            lister.load_gallery().await;
        });

        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Render every panel from the current state
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        Self::apply_all(ui, Self::snapshot_panels(state_manager));
    }

    fn snapshot_panels(state_manager: &StateManager) -> Panels {
        state_manager.read(|s| Panels {
            gallery: view::gallery(s),
            results: view::results(s),
            revealed: s.results_revealed,
            visualization: view::visualization(s),
            timing: view::timing(s),
        })
    }

    fn apply_all(ui: &MainWindow, panels: Panels) {
        Self::apply_gallery(ui, panels.gallery);
        Self::apply_results(ui, panels.results);
        ui.set_results_revealed(panels.revealed);
        Self::apply_visualization(ui, panels.visualization);
        Self::apply_timing(ui, panels.timing);
    }

    fn setup_callbacks(ui: &MainWindow, bridge: &EventLoopBridge<MainWindow>, orchestrator: &AnalysisOrchestrator) {
        let bridge_handle = bridge.clone_handle();
        let orchestrator_clone = orchestrator.clone();

        // Gallery entry clicked
        ui.on_image_selected(move |name| {
            let image = ImageRef::new(name.as_str());
            tracing::info!("Gallery entry selected: {}", image);

            let orchestrator = orchestrator_clone.clone();
            bridge_handle.spawn_async(move || async move {
                let outcome = orchestrator.select_image(image).await;
                tracing::debug!("Selection finished: {:?}", outcome);
            });
        });

        let bridge_handle = bridge.clone_handle();
        let orchestrator_clone = orchestrator.clone();

        // "Try Again" in the error panel
        ui.on_retry_requested(move || {
            tracing::info!("Retry button clicked");

            let orchestrator = orchestrator_clone.clone();
            bridge_handle.spawn_async(move || async move {
                match orchestrator.retry().await {
                    Some(outcome) => tracing::debug!("Retry finished: {:?}", outcome),
                    None => tracing::debug!("Retry ignored - no error panel shown"),
                }
            });
        });

        // Window close event handler
        let orchestrator_clone = orchestrator.clone();
        ui.window().on_close_requested(move || {
            tracing::info!("Close requested - stopping light cycle");
            orchestrator_clone.stop_simulation();
            slint::CloseRequestResponse::HideWindow
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Subscribe to state changes and update UI accordingly
    ///
    /// A background thread turns each change into the presentation of the
    /// affected panel and queues it on the event loop.
    fn setup_state_subscription(bridge: &EventLoopBridge<MainWindow>, state_manager: &Arc<StateManager>) {
        let bridge_handle = bridge.clone_handle();
        let state_manager_clone = Arc::clone(state_manager);
        let mut rx = state_manager.subscribe();

        let spawned = std::thread::Builder::new()
            .name("trafficdash-state-listener".to_string())
            .spawn(move || {
                tracing::debug!("State subscription thread started");

                loop {
                    match rx.blocking_recv() {
                        Ok(change) => {
                            tracing::trace!("State change received: {:?}", change);
                            if bridge_handle.take_resync() {
                                // An earlier update was dropped; the snapshot covers this change too
                                tracing::debug!("Redrawing all panels after dropped UI updates");
                                let panels = Self::snapshot_panels(&state_manager_clone);
                                bridge_handle.update_ui(move |ui| Self::apply_all(ui, panels));
                            } else {
                                Self::render_change(&bridge_handle, &state_manager_clone, change);
                            }
                        }
                        Err(RecvError::Closed) => {
                            tracing::info!("State broadcast channel closed - shutting down subscription thread");
                            break;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // Panels may now be out of date; redraw everything
                            tracing::warn!("State subscription lagged - {} events were skipped", skipped);
                            let panels = Self::snapshot_panels(&state_manager_clone);
                            bridge_handle.update_ui(move |ui| Self::apply_all(ui, panels));
                        }
                    }
                }

                tracing::debug!("State subscription thread terminated gracefully");
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start state subscription thread: {}", e);
        }
    }

    fn render_change(bridge: &EventLoopBridgeHandle<MainWindow>, state_manager: &StateManager, change: StateChange) {
        match change {
            StateChange::GalleryChanged => {
                let gallery = state_manager.read(view::gallery);
                bridge.update_ui(move |ui| Self::apply_gallery(ui, gallery));
            }
            StateChange::ThumbnailsUpdated { count } => {
                tracing::trace!("{} thumbnails decoded", count);
                // The loading preview is a thumbnail too
                let (gallery, results) = state_manager.read(|s| (view::gallery(s), view::results(s)));
                bridge.update_ui(move |ui| {
                    Self::apply_gallery(ui, gallery);
                    Self::apply_results(ui, results);
                });
            }
            StateChange::SelectionChanged { selected } => {
                tracing::debug!("Selection changed: {:?}", selected);
                let gallery = state_manager.read(view::gallery);
                bridge.update_ui(move |ui| {
                    let scroll_target = gallery.scroll_target;
                    Self::apply_gallery(ui, gallery);
                    if let Some(index) = scroll_target {
                        ui.invoke_scroll_to(index as i32);
                    }
                });
            }
            StateChange::ResultsChanged => {
                let results = state_manager.read(view::results);
                bridge.update_ui(move |ui| Self::apply_results(ui, results));
            }
            StateChange::ResultsRevealed { revealed } => {
                bridge.update_ui(move |ui| ui.set_results_revealed(revealed));
            }
            StateChange::VisualizationChanged => {
                let visualization = state_manager.read(view::visualization);
                bridge.update_ui(move |ui| Self::apply_visualization(ui, visualization));
            }
            StateChange::TimingChanged { .. } | StateChange::LightChanged { .. } => {
                let timing = state_manager.read(view::timing);
                bridge.update_ui(move |ui| Self::apply_timing(ui, timing));
            }
        }
    }

    fn apply_gallery(ui: &MainWindow, gallery: GalleryPresentation) {
        let items: Vec<GalleryItem> = gallery
            .rows
            .into_iter()
            .map(|row| GalleryItem {
                name: row.name.into(),
                alt: row.alt.into(),
                has_thumbnail: row.thumbnail.is_some(),
                thumbnail: row.thumbnail.as_ref().map(to_slint_image).unwrap_or_default(),
                selected: row.selected,
            })
            .collect();

        ui.set_gallery_message(gallery.message.into());
        ui.set_gallery(ModelRc::new(VecModel::from(items)));
    }

    fn apply_results(ui: &MainWindow, results: ResultsPresentation) {
        ui.set_results_mode(results.mode.as_index());

        ui.set_active_step(results.active_step as i32);
        ui.set_progress_percent(i32::from(results.progress_percent));
        ui.set_progress_complete(results.progress_complete);
        ui.set_has_preview(results.preview.is_some());
        ui.set_preview_image(results.preview.as_ref().map(to_slint_image).unwrap_or_default());
        ui.set_preview_name(results.preview_name.into());

        ui.set_prediction(results.prediction.into());
        ui.set_congestion_class(results.congestion_class.into());
        ui.set_vehicle_count(results.vehicle_count as i32);

        let lanes: Vec<LaneRow> = results
            .lanes
            .into_iter()
            .map(|(lane, count)| LaneRow {
                lane: lane.into(),
                count: count.into(),
            })
            .collect();
        ui.set_lanes(ModelRc::new(VecModel::from(lanes)));

        let timing_rows: Vec<TimingRow> = results
            .timing_rows
            .into_iter()
            .map(|(label, value)| TimingRow {
                label: label.into(),
                value: value.into(),
            })
            .collect();
        ui.set_timing_rows(ModelRc::new(VecModel::from(timing_rows)));

        ui.set_error_message(results.error_message.into());
    }

    fn apply_visualization(ui: &MainWindow, visualization: VisualizationPresentation) {
        ui.set_visualization_mode(visualization.mode);
        ui.set_active_dot(visualization.active_dot as i32);
        ui.set_visualization(visualization.image.as_ref().map(to_slint_image).unwrap_or_default());
    }

    fn apply_timing(ui: &MainWindow, timing: TimingPresentation) {
        ui.set_timing_headline(timing.headline.into());
        ui.set_timing_note(timing.note.into());
        ui.set_green_on(timing.green);
        ui.set_yellow_on(timing.yellow);
        ui.set_red_on(timing.red);
    }
}

/// Presentation of every panel at one instant
struct Panels {
    gallery: GalleryPresentation,
    results: ResultsPresentation,
    revealed: bool,
    visualization: VisualizationPresentation,
    timing: TimingPresentation,
}

/// Copy decoded pixels into a Slint image; must run on the event loop thread
fn to_slint_image(image: &DecodedImage) -> slint::Image {
    let buffer = SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(&image.rgba, image.width, image.height);
    slint::Image::from_rgba8(buffer)
}
