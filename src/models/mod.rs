//! Data models for the TrafficDash application.
//!
//! - [`ImageRef`]/[`ImageCatalog`]: selectable images as listed by the backend
//! - [`AnalysisResult`]: one validated analysis payload
//! - [`DashboardState`]: the view model every panel of the window is rendered from
//! - [`DashboardConfig`]: user settings loaded from `TrafficDash Config.yaml`

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod dashboard_state;

pub use analysis::{AnalysisResult, CongestionLevel, LightPhase, LightTimings};
pub use catalog::{ImageCatalog, ImageRef};
pub use config::{AnimationSettings, BackendSettings, DashboardConfig, LoggingSettings};
pub use dashboard_state::{
    DashboardState, DecodedImage, ErrorPanel, GalleryView, LoadingPanel, ResultsPanel,
    ResultsView, TimingDisplay, VisualizationPanel,
};
