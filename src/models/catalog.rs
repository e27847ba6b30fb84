use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory (relative to the backend root) that holds the traffic images.
pub const IMAGE_DATA_DIR: &str = "data";

/// Opaque identifier of a selectable traffic image (its filename).
///
/// Created when the catalog is fetched and discarded when a new catalog
/// replaces the gallery. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    /// The bare filename as listed by the backend.
    pub fn filename(&self) -> &str {
        &self.0
    }

    /// Path the analysis endpoint expects in `image_path`, e.g. `data/cam1.png`.
    pub fn analysis_path(&self) -> String {
        format!("{}/{}", IMAGE_DATA_DIR, self.0)
    }

    /// Alt text shown while the thumbnail is missing.
    pub fn alt_text(&self) -> String {
        format!("Traffic Image: {}", self.0)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Response body of `GET /api/images`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageCatalog {
    #[serde(default)]
    pub images: Vec<ImageRef>,
}
