use crate::metrics::Metrics;
use crate::models::{GalleryView, ImageRef};
use crate::services::api::TrafficApi;
use crate::services::render::decode_image;
use crate::state::StateManager;
use std::sync::Arc;

/// Fetches the image catalog and renders the gallery
///
/// Failure is terminal for a load: the gallery shows an in-place message and
/// nothing is retried.
#[derive(Clone)]
pub struct ImageLister {
    state: Arc<StateManager>,
    api: Arc<dyn TrafficApi>,
    metrics: Arc<Metrics>,
}

impl ImageLister {
    pub fn new(state: Arc<StateManager>, api: Arc<dyn TrafficApi>, metrics: Arc<Metrics>) -> Self {
        Self { state, api, metrics }
    }

    /// Load the catalog and render one gallery entry per image
    ///
    /// # Returns
    /// The catalog generation the gallery was rendered under, for
    /// [`load_thumbnails`](Self::load_thumbnails)
    pub async fn fetch_images(&self) -> u64 {
        self.state.show_gallery(GalleryView::Loading);

        match self.api.list_images().await {
            Ok(images) if images.is_empty() => {
                tracing::info!("Image catalog is empty");
                self.metrics.record_catalog_load();
                self.state.show_gallery(GalleryView::Empty)
            }
            Ok(images) => {
                tracing::info!("Rendering gallery with {} images", images.len());
                self.metrics.record_catalog_load();
                self.state.show_gallery(GalleryView::Entries(images))
            }
            Err(e) => {
                tracing::error!("Error fetching images: {}", e);
                self.metrics.record_catalog_failure();
                self.state.show_gallery(GalleryView::Unavailable)
            }
        }
    }

    /// Fetch and decode a thumbnail for every gallery entry
    ///
    /// Entries whose image cannot be loaded keep their alt text. Thumbnails
    /// arriving after a newer catalog replaced the gallery are dropped.
    pub async fn load_thumbnails(&self, catalog_generation: u64) {
        let images: Vec<ImageRef> = self.state.read(|s| s.gallery.entries().to_vec());

        let mut tasks = tokio::task::JoinSet::new();
        for image in images {
            let api = Arc::clone(&self.api);
            tasks.spawn(async move {
                let decoded = match api.fetch_image(image.clone()).await {
                    Ok(bytes) => decode_image(&bytes).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                (image, decoded)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((image, Ok(thumbnail))) => {
                    if !self.state.add_thumbnail(catalog_generation, image.clone(), thumbnail) {
                        tracing::debug!("Dropping thumbnail for replaced catalog: {}", image);
                    }
                }
                Ok((image, Err(e))) => {
                    tracing::warn!("Thumbnail unavailable for {}: {}", image, e);
                }
                Err(e) => {
                    tracing::error!("Thumbnail task join error: {}", e);
                }
            }
        }
    }

    /// Catalog load followed by thumbnail loading, as done on start-up
    pub async fn load_gallery(&self) {
        let catalog_generation = self.fetch_images().await;
        self.load_thumbnails(catalog_generation).await;
    }
}
