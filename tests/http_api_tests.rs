//! Integration tests for the reqwest backend client
//!
//! An axum stub plays the analysis backend on an ephemeral port. It answers
//! `POST /api/analyze` according to the requested image and records every
//! request body so the tests can check what the dashboard actually sent.

mod common;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{Harness, png_base64, png_bytes};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use trafficdash::models::{AnimationSettings, BackendSettings, ImageRef, ResultsPanel, TimingDisplay, VisualizationPanel};
use trafficdash::services::{AnalysisOutcome, ApiError, HttpTrafficApi, TrafficApi};

#[derive(Clone, Default)]
struct StubBackend {
    catalog: Vec<&'static str>,
    analyze_bodies: Arc<Mutex<Vec<Value>>>,
}

impl StubBackend {
    fn with_catalog(catalog: &[&'static str]) -> Self {
        Self {
            catalog: catalog.to_vec(),
            ..Self::default()
        }
    }

    fn analyze_bodies(&self) -> Vec<Value> {
        self.analyze_bodies.lock().unwrap().clone()
    }
}

async fn list_images(State(stub): State<StubBackend>) -> Json<Value> {
    Json(json!({ "images": stub.catalog }))
}

async fn analyze(State(stub): State<StubBackend>, Json(body): Json<Value>) -> impl IntoResponse {
    stub.analyze_bodies.lock().unwrap().push(body.clone());

    let path = body["image_path"].as_str().unwrap_or_default().to_string();
    match path.as_str() {
        "data/broken.png" => (StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()),
        "data/missing.png" => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Image not found: data/missing.png" }).to_string(),
        ),
        "data/malformed.png" => (
            StatusCode::OK,
            json!({ "prediction": "Low Congestion", "counts": [1, 2] }).to_string(),
        ),
        "data/slow.png" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, "{}".to_string())
        }
        _ => (
            StatusCode::OK,
            json!({
                "prediction": "Medium Congestion",
                "counts": [5, 3, 0, 2],
                "timings": { "green": 3, "yellow": 1, "red": 2, "vehicle_count": 10 },
                "visualization": png_base64(12, 9),
            })
            .to_string(),
        ),
    }
}

async fn image_file(Path(file): Path<String>) -> impl IntoResponse {
    if file == "gone.png" {
        return (StatusCode::NOT_FOUND, Vec::new());
    }
    (StatusCode::OK, png_bytes(16, 10))
}

/// Serve the stub and return a client pointed at it
async fn spawn_backend(stub: StubBackend, request_timeout_secs: u64) -> HttpTrafficApi {
    let app = Router::new()
        .route("/api/images", get(list_images))
        .route("/api/analyze", post(analyze))
        .route("/data/:file", get(image_file))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpTrafficApi::new(&BackendSettings {
        base_url: format!("http://{}", addr),
        request_timeout_secs,
    })
    .unwrap()
}

#[tokio::test]
async fn test_list_images() {
    let api = spawn_backend(StubBackend::with_catalog(&["a.png", "b.jpg"]), 5).await;

    let images = api.list_images().await.unwrap();
    assert_eq!(images, vec![ImageRef::from("a.png"), ImageRef::from("b.jpg")]);
}

#[tokio::test]
async fn test_analyze_posts_image_path_once() {
    let stub = StubBackend::default();
    let api = spawn_backend(stub.clone(), 5).await;

    let result = api.analyze(ImageRef::from("cam1.png")).await.unwrap();

    assert_eq!(result.prediction, "Medium Congestion");
    assert_eq!(result.counts, vec![5, 3, 0, 2]);
    assert_eq!(result.timings.vehicle_count, 10);
    assert!(result.visualization.is_some());
    assert_eq!(stub.analyze_bodies(), vec![json!({ "image_path": "data/cam1.png" })]);
}

#[tokio::test]
async fn test_analyze_status_without_error_field() {
    let api = spawn_backend(StubBackend::default(), 5).await;

    let err = api.analyze(ImageRef::from("broken.png")).await.unwrap_err();
    assert_eq!(err.to_string(), "Analysis failed (500)");
}

#[tokio::test]
async fn test_analyze_status_with_error_field() {
    let api = spawn_backend(StubBackend::default(), 5).await;

    let err = api.analyze(ImageRef::from("missing.png")).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            message: "Image not found: data/missing.png".to_string(),
        }
    );
}

#[tokio::test]
async fn test_analyze_rejects_payload_without_timings() {
    let api = spawn_backend(StubBackend::default(), 5).await;

    let err = api.analyze(ImageRef::from("malformed.png")).await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_analyze_times_out() {
    let api = spawn_backend(StubBackend::default(), 1).await;

    let err = api.analyze(ImageRef::from("slow.png")).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop, so nothing listens on the port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpTrafficApi::new(&BackendSettings {
        base_url: format!("http://{}", addr),
        request_timeout_secs: 5,
    })
    .unwrap();

    assert!(matches!(api.list_images().await, Err(ApiError::Transport(_))));
}

#[tokio::test]
async fn test_fetch_image() {
    let api = spawn_backend(StubBackend::default(), 5).await;

    let bytes = api.fetch_image(ImageRef::from("cam1.png")).await.unwrap();
    assert_eq!(bytes, png_bytes(16, 10));

    let err = api.fetch_image(ImageRef::from("gone.png")).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_dashboard_end_to_end_over_http() {
    let stub = StubBackend::with_catalog(&["cam1.png", "gone.png"]);
    let api = spawn_backend(stub.clone(), 5).await;

    let settings = AnimationSettings {
        first_progress_delay_ms: 5,
        second_progress_delay_ms: 10,
        dot_pulse_interval_ms: 5,
        fade_in_delay_ms: 5,
        simulation_start_delay_ms: 10,
        light_tick_ms: 60_000,
    };
    let harness = Harness::with_settings(Arc::new(api), settings);

    harness.lister.load_gallery().await;
    let (entries, thumbnails) = harness
        .state
        .read(|s| (s.gallery.entries().to_vec(), s.thumbnails.clone()));
    assert_eq!(entries, vec![ImageRef::from("cam1.png"), ImageRef::from("gone.png")]);
    assert_eq!(thumbnails.len(), 1);
    assert_eq!(thumbnails[&ImageRef::from("cam1.png")].width, 16);

    let outcome = harness
        .orchestrator
        .select_image(ImageRef::from("cam1.png"))
        .await;
    assert_eq!(outcome, AnalysisOutcome::Completed);
    assert_eq!(stub.analyze_bodies().len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = harness.state.snapshot();
    assert!(matches!(state.results, ResultsPanel::Ready(_)));
    assert!(state.results_revealed);
    assert!(matches!(state.visualization, VisualizationPanel::Ready(ref image) if image.width == 12));
    assert!(matches!(state.timing, TimingDisplay::Countdown { seconds: 3, .. }));
    assert!(harness.orchestrator.light_cycle().is_running());

    harness.orchestrator.stop_simulation();
}
