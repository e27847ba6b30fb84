//! TrafficDash - Desktop dashboard for traffic image analysis
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for TrafficDash. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (HTTP requests, animation timers)
//! - State management ([`StateManager`])
//! - Services ([`ImageLister`], [`AnalysisOrchestrator`]) over [`HttpTrafficApi`]
//! - GUI controller ([`GuiController`] - bridges the Slint window with the services)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop (blocking, synchronous)
//! - **Tokio workers**: Backend requests, cosmetic timers, the light cycle
//! - **State listener**: Background std::thread for reactive UI updates
//!
//! # Configuration
//!
//! Expected in `TrafficDash Data/TrafficDash Config.yaml`; every key is optional.
//! Environment variables such as `TRAFFICDASH__BACKEND__BASE_URL` override the file.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use trafficdash::services::{AnalysisOrchestrator, HttpTrafficApi, ImageLister, TrafficApi};
use trafficdash::ui::GuiController;
use trafficdash::{APP_NAME, ConfigManager, Metrics, StateManager, VERSION};

/// Directory holding `TrafficDash Config.yaml`
const CONFIG_DIR: &str = "TrafficDash Data";

/// Main entry point for the TrafficDash GUI application
///
/// # Errors
///
/// This function can fail if:
/// - The configuration file is invalid YAML
/// - Logging initialization fails (disk space, permissions)
/// - The backend URL is invalid
/// - Tokio runtime creation fails (system resources)
/// - Slint UI initialization fails (graphics drivers, display)
fn main() -> Result<()> {
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let config = config_manager.load_config()?;

    // Held until exit so buffered log lines are flushed
    let _log_guard = trafficdash::logging::setup_logging(&config.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .thread_name("trafficdash-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 4);

    let metrics = Arc::new(Metrics::new());
    let state_manager = Arc::new(StateManager::new());

    let api: Arc<dyn TrafficApi> =
        Arc::new(HttpTrafficApi::new(&config.backend).context("Failed to create backend client")?);

    let lister = ImageLister::new(state_manager.clone(), api.clone(), metrics.clone());
    let orchestrator = AnalysisOrchestrator::new(
        state_manager.clone(),
        api,
        config.animation.clone(),
        metrics.clone(),
    );

    // reqwest and the timers need the runtime context while the controller is built
    let gui_controller = {
        let _enter = runtime.enter();
        GuiController::new(
            state_manager,
            lister,
            orchestrator.clone(),
            metrics.clone(),
            runtime.handle().clone(),
        )?
    };

    tracing::info!("GUI controller initialized, launching window");

    // Blocks until the window is closed
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    orchestrator.stop_simulation();
    runtime.shutdown_timeout(Duration::from_secs(5));

    metrics.log_summary();
    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
