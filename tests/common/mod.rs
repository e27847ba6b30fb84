//! Shared fixtures for the integration tests
//!
//! - [`MockApi`]: mockall double for strict request expectations
//! - [`ScriptedApi`]: fake backend with per-image latency, for ordering races
//! - sample payloads and a PNG encoder for thumbnails and visualizations

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgba, RgbaImage};
use mockall::mock;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trafficdash::metrics::Metrics;
use trafficdash::models::{AnalysisResult, AnimationSettings, ImageRef, LightTimings};
use trafficdash::services::{AnalysisOrchestrator, ApiError, ImageLister, TrafficApi};
use trafficdash::state::StateManager;

mock! {
    pub Api {}

    #[async_trait]
    impl TrafficApi for Api {
        async fn list_images(&self) -> Result<Vec<ImageRef>, ApiError>;
        async fn analyze(&self, image: ImageRef) -> Result<AnalysisResult, ApiError>;
        async fn fetch_image(&self, image: ImageRef) -> Result<Vec<u8>, ApiError>;
    }
}

/// Mock whose image downloads always succeed, for tests that only care about analysis
pub fn mock_api() -> MockApi {
    let mut api = MockApi::new();
    api.expect_fetch_image().returning(|_| Ok(png_bytes(8, 6)));
    api
}

pub fn timings(green: u32, yellow: u32, red: u32, vehicle_count: u32) -> LightTimings {
    LightTimings {
        green,
        yellow,
        red,
        vehicle_count,
    }
}

pub fn sample_result(prediction: &str) -> AnalysisResult {
    AnalysisResult {
        prediction: prediction.to_string(),
        counts: vec![4, 2, 1],
        timings: timings(2, 1, 3, 7),
        visualization: None,
    }
}

/// Solid-colour PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([52, 152, 219, 255]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png_bytes(width, height))
}

/// Fake backend answering each image after a fixed delay
#[derive(Default)]
pub struct ScriptedApi {
    catalog: Vec<ImageRef>,
    responses: HashMap<ImageRef, (Duration, Result<AnalysisResult, ApiError>)>,
    requests: Mutex<Vec<ImageRef>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, images: &[&str]) -> Self {
        self.catalog = images.iter().map(|name| ImageRef::from(*name)).collect();
        self
    }

    pub fn respond(mut self, image: &str, delay: Duration, response: Result<AnalysisResult, ApiError>) -> Self {
        self.responses.insert(ImageRef::from(image), (delay, response));
        self
    }

    /// Images analyzed so far, in request order
    pub fn requests(&self) -> Vec<ImageRef> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrafficApi for ScriptedApi {
    async fn list_images(&self) -> Result<Vec<ImageRef>, ApiError> {
        Ok(self.catalog.clone())
    }

    async fn analyze(&self, image: ImageRef) -> Result<AnalysisResult, ApiError> {
        self.requests.lock().unwrap().push(image.clone());

        let (delay, response) = self
            .responses
            .get(&image)
            .cloned()
            .unwrap_or((Duration::ZERO, Err(ApiError::from_failed_analysis(404, b"{}"))));

        tokio::time::sleep(delay).await;
        response
    }

    async fn fetch_image(&self, _image: ImageRef) -> Result<Vec<u8>, ApiError> {
        Ok(png_bytes(8, 6))
    }
}

/// Services wired the way `main` wires them
pub struct Harness {
    pub state: Arc<StateManager>,
    pub metrics: Arc<Metrics>,
    pub lister: ImageLister,
    pub orchestrator: AnalysisOrchestrator,
}

impl Harness {
    pub fn new(api: Arc<dyn TrafficApi>) -> Self {
        Self::with_settings(api, AnimationSettings::default())
    }

    pub fn with_settings(api: Arc<dyn TrafficApi>, settings: AnimationSettings) -> Self {
        let state = Arc::new(StateManager::new());
        let metrics = Arc::new(Metrics::new());
        let lister = ImageLister::new(state.clone(), api.clone(), metrics.clone());
        let orchestrator = AnalysisOrchestrator::new(state.clone(), api, settings, metrics.clone());
        Self {
            state,
            metrics,
            lister,
            orchestrator,
        }
    }
}
