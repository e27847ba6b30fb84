//! Services module - dashboard behaviour independent of the UI toolkit.
//!
//! The services read and write [`DashboardState`](crate::models::DashboardState)
//! through the [`StateManager`](crate::state::StateManager) and never touch Slint
//! types, so every flow can be driven from tests with a fake backend.
//!
//! # Components
//!
//! - [`TrafficApi`] / [`HttpTrafficApi`]: the analysis backend (`/api/images`,
//!   `/api/analyze`, `/data/<file>`)
//! - [`ImageLister`]: catalog load and gallery rendering, plus thumbnails
//! - [`AnalysisOrchestrator`]: one selection from click to rendered results,
//!   guarded by a per-selection generation number
//! - [`ResultRenderer`]: formats an [`AnalysisResult`](crate::models::AnalysisResult)
//!   into the results and visualization panels
//! - [`LightCycle`] / [`LightCycleSlot`]: the cosmetic traffic-light countdown
//!
//! # Usage Example
//!
//! ```ignore
//! use trafficdash::services::{AnalysisOrchestrator, HttpTrafficApi, ImageLister};
//!
//! let api: Arc<dyn TrafficApi> = Arc::new(HttpTrafficApi::new(&config.backend)?);
//! let lister = ImageLister::new(state.clone(), api.clone(), metrics.clone());
//! let orchestrator = AnalysisOrchestrator::new(state, api, config.animation, metrics);
//!
//! lister.load_gallery().await;
//! orchestrator.select_image(ImageRef::from("cam1.png")).await;
//! ```

pub mod analysis;
pub mod api;
pub mod catalog;
pub mod light_cycle;
pub mod render;

pub use analysis::{AnalysisOrchestrator, AnalysisOutcome};
pub use api::{ApiError, HttpTrafficApi, TrafficApi};
pub use catalog::ImageLister;
pub use light_cycle::{LightCycle, LightCycleSession, LightCycleSlot, Tick};
pub use render::{DecodeError, ResultRenderer, decode_image, decode_visualization};
