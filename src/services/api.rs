use crate::models::{AnalysisResult, BackendSettings, ImageCatalog, ImageRef};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while talking to the analysis backend
///
/// `Display` is the text shown in the error panel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success status; `message` is the server's `error` field or a generic fallback.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Build the failure for a non-success analysis response.
    ///
    /// Falls back to "Analysis failed (<status>)" when the body is not JSON or
    /// carries no `error` field.
    pub fn from_failed_analysis(status: u16, body: &[u8]) -> Self {
        let payload: ErrorPayload = serde_json::from_slice(body).unwrap_or_default();
        let message = payload
            .error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("Analysis failed ({})", status));
        ApiError::Status { status, message }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Body of a failed analysis response
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

/// Body of `POST /api/analyze`
#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    image_path: String,
}

/// The analysis backend as seen by the dashboard
///
/// Implemented over HTTP by [`HttpTrafficApi`]; tests substitute fakes.
#[async_trait]
pub trait TrafficApi: Send + Sync {
    /// `GET /api/images`
    async fn list_images(&self) -> Result<Vec<ImageRef>, ApiError>;

    /// `POST /api/analyze` for one image, validated into an [`AnalysisResult`]
    async fn analyze(&self, image: ImageRef) -> Result<AnalysisResult, ApiError>;

    /// Raw bytes of an image from the static `data/` path
    async fn fetch_image(&self, image: ImageRef) -> Result<Vec<u8>, ApiError>;
}

/// reqwest-backed [`TrafficApi`]
#[derive(Debug, Clone)]
pub struct HttpTrafficApi {
    client: Client,
    base_url: Url,
}

impl HttpTrafficApi {
    /// Create a client for the configured backend
    ///
    /// # Errors
    /// Fails if the base URL does not parse or the HTTP client cannot be built.
    pub fn new(settings: &BackendSettings) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(&settings.base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }

        let client = Client::builder().timeout(settings.request_timeout()).build()?;

        tracing::info!(
            "HTTP backend client ready: base_url={}, timeout={}s",
            base_url,
            settings.request_timeout_secs
        );

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Static URL of an image, e.g. `<base>/data/cam1.png`
    pub fn image_url(&self, image: &ImageRef) -> Result<Url, ApiError> {
        self.endpoint(&[crate::models::catalog::IMAGE_DATA_DIR, image.filename()])
    }
}

#[async_trait]
impl TrafficApi for HttpTrafficApi {
    async fn list_images(&self) -> Result<Vec<ImageRef>, ApiError> {
        let url = self.endpoint(&["api", "images"])?;
        tracing::debug!("Fetching image catalog from {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: format!("Image catalog request failed ({})", status.as_u16()),
            });
        }

        let body = response.bytes().await?;
        let catalog: ImageCatalog =
            serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        tracing::info!("Image catalog lists {} images", catalog.images.len());
        Ok(catalog.images)
    }

    async fn analyze(&self, image: ImageRef) -> Result<AnalysisResult, ApiError> {
        let url = self.endpoint(&["api", "analyze"])?;
        let request = AnalyzeRequest {
            image_path: image.analysis_path(),
        };
        tracing::debug!("Requesting analysis of {} at {}", request.image_path, url);

        let response = self.client.post(url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            // An unreadable error body is treated like an empty one
            let body = response.bytes().await.unwrap_or_default();
            let err = ApiError::from_failed_analysis(status.as_u16(), &body);
            tracing::warn!("Analysis of {} rejected: {}", image, err);
            return Err(err);
        }

        let body = response.bytes().await?;
        AnalysisResult::from_json(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    async fn fetch_image(&self, image: ImageRef) -> Result<Vec<u8>, ApiError> {
        let url = self.image_url(&image)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: format!("Image {} unavailable ({})", image, status.as_u16()),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> HttpTrafficApi {
        HttpTrafficApi::new(&BackendSettings {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_generic_failure_message() {
        let err = ApiError::from_failed_analysis(500, b"{}");
        assert_eq!(err.to_string(), "Analysis failed (500)");
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[test]
    fn test_server_error_message_wins() {
        let err = ApiError::from_failed_analysis(404, br#"{"error": "Image not found: data/x.png"}"#);
        assert_eq!(err.to_string(), "Image not found: data/x.png");
    }

    #[test]
    fn test_unparseable_error_body_falls_back() {
        let err = ApiError::from_failed_analysis(502, b"<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Analysis failed (502)");
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let api = api("http://127.0.0.1:5000/");
        assert_eq!(
            api.endpoint(&["api", "images"]).unwrap().as_str(),
            "http://127.0.0.1:5000/api/images"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let api = api("http://traffic.local/dashboard");
        assert_eq!(
            api.endpoint(&["api", "analyze"]).unwrap().as_str(),
            "http://traffic.local/dashboard/api/analyze"
        );
    }

    #[test]
    fn test_image_url_encodes_filename() {
        let api = api("http://127.0.0.1:5000");
        let url = api.image_url(&ImageRef::from("main street.png")).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/data/main%20street.png");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpTrafficApi::new(&BackendSettings {
            base_url: "not a url".to_string(),
            request_timeout_secs: 5,
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
