//! Result renderer - formats an [`AnalysisResult`] into the results and visualization panels.

use crate::models::{AnalysisResult, DashboardState, DecodedImage, ResultsPanel, ResultsView, VisualizationPanel};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Why an image payload could not be turned into pixels
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode PNG/JPEG bytes into RGBA8 pixels
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage::new(width, height, rgba.into_raw()))
}

/// Decode a base64 visualization payload (tolerates a `data:` URL prefix)
pub fn decode_visualization(encoded: &str) -> Result<DecodedImage, DecodeError> {
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };
    let bytes = STANDARD.decode(payload.trim())?;
    decode_image(&bytes)
}

/// Formats analysis results into [`DashboardState`]
///
/// Pure rendering: the input has already been validated, so there are no error
/// paths. A visualization that cannot be decoded is logged and treated as absent.
pub struct ResultRenderer;

impl ResultRenderer {
    /// Build the results view for a validated analysis
    pub fn results_view(result: &AnalysisResult) -> ResultsView {
        ResultsView {
            prediction: result.prediction.clone(),
            congestion: result.congestion(),
            vehicle_count: result.timings.vehicle_count,
            lanes: result.counts.clone(),
            timings: result.timings,
        }
    }

    /// Render `result` into the results panel and, if present, the visualization panel
    ///
    /// Without a usable visualization the panel keeps whatever placeholder preceded it.
    pub fn render(state: &mut DashboardState, result: &AnalysisResult) {
        state.results = ResultsPanel::Ready(Self::results_view(result));

        let Some(encoded) = result.visualization.as_deref() else {
            tracing::debug!("Analysis returned no visualization");
            return;
        };

        match decode_visualization(encoded) {
            Ok(image) => {
                tracing::debug!("Visualization decoded: {}x{}", image.width, image.height);
                state.visualization = VisualizationPanel::Ready(image);
            }
            Err(e) => {
                tracing::warn!("Ignoring undecodable visualization: {}", e);
            }
        }
    }
}
