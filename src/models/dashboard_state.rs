use crate::models::analysis::{CongestionLevel, LightPhase, LightTimings};
use crate::models::catalog::ImageRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Labels of the three loading steps, in order.
pub const LOADING_STEPS: [&str; 3] = [
    "Detecting vehicles...",
    "Analyzing congestion patterns",
    "Calculating optimal timing",
];

/// Fill shown as soon as the loading panel appears.
pub const INITIAL_FILL_PERCENT: u8 = 10;

/// Number of dots in the "Generating visualization..." pulse.
pub const PULSE_DOT_COUNT: usize = 3;

pub const EMPTY_CATALOG_MESSAGE: &str = "No traffic images available";
pub const CATALOG_ERROR_MESSAGE: &str = "Error loading images. Please try again.";
pub const TIMING_NOTE: &str = "Timing dynamically adjusted based on traffic conditions";

/// Decoded RGBA8 pixels, shared cheaply between state snapshots.
#[derive(Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba: rgba.into(),
        }
    }
}

// Pixel buffers are never mutated, so identity is enough for change detection.
impl PartialEq for DecodedImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && Arc::ptr_eq(&self.rgba, &other.rgba)
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Contents of the image gallery region.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GalleryView {
    #[default]
    Loading,
    Empty,
    Unavailable,
    Entries(Vec<ImageRef>),
}

impl GalleryView {
    /// Selectable entries; empty for every non-`Entries` state.
    pub fn entries(&self) -> &[ImageRef] {
        match self {
            GalleryView::Entries(images) => images,
            _ => &[],
        }
    }

    /// In-place message shown instead of entries, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            GalleryView::Loading => Some("Loading traffic images..."),
            GalleryView::Empty => Some(EMPTY_CATALOG_MESSAGE),
            GalleryView::Unavailable => Some(CATALOG_ERROR_MESSAGE),
            GalleryView::Entries(_) => None,
        }
    }
}

/// Loading panel with its three-step progress indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingPanel {
    /// Image being analyzed; shown as a preview with a scanning line.
    pub image: ImageRef,
    pub active_step: usize,
    pub fill_percent: u8,
    /// Set when the response arrived; the fill turns to the success colour.
    pub complete: bool,
}

impl LoadingPanel {
    pub fn new(image: ImageRef) -> Self {
        Self {
            image,
            active_step: 0,
            fill_percent: INITIAL_FILL_PERCENT,
            complete: false,
        }
    }

    /// Move to `step` / `fill_percent` unless that would go backwards.
    pub fn advance(&mut self, step: usize, fill_percent: u8) -> bool {
        if self.complete || fill_percent <= self.fill_percent {
            return false;
        }
        self.active_step = step.min(LOADING_STEPS.len() - 1);
        self.fill_percent = fill_percent.min(100);
        true
    }

    pub fn finish(&mut self) {
        self.fill_percent = 100;
        self.complete = true;
    }

    pub fn active_label(&self) -> &'static str {
        LOADING_STEPS[self.active_step.min(LOADING_STEPS.len() - 1)]
    }
}

/// Formatted statistics of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub prediction: String,
    pub congestion: CongestionLevel,
    pub vehicle_count: u32,
    /// Per-lane counts in lane order.
    pub lanes: Vec<u32>,
    pub timings: LightTimings,
}

impl ResultsView {
    pub const CONGESTION_LABEL: &'static str = "Traffic Congestion Level";
    pub const VEHICLES_LABEL: &'static str = "Total Vehicles Detected";

    /// ("Lane N", "C vehicles") rows, lanes numbered from 1.
    pub fn lane_rows(&self) -> Vec<(String, String)> {
        self.lanes
            .iter()
            .enumerate()
            .map(|(index, count)| (format!("Lane {}", index + 1), format!("{} vehicles", count)))
            .collect()
    }

    pub fn timing_rows(&self) -> [(&'static str, String); 3] {
        [
            ("Green Light", format!("{} seconds", self.timings.green)),
            ("Yellow Light", format!("{} seconds", self.timings.yellow)),
            ("Red Light", format!("{} seconds", self.timings.red)),
        ]
    }
}

/// Error panel shown after a failed analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPanel {
    pub message: String,
    /// Image the retry action re-analyzes.
    pub retry: ImageRef,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultsPanel {
    #[default]
    Idle,
    Loading(LoadingPanel),
    Ready(ResultsView),
    Failed(ErrorPanel),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum VisualizationPanel {
    #[default]
    Idle,
    /// Placeholder with a pulsing "..."; `active_dot` is the highlighted dot.
    Generating { active_dot: usize },
    Ready(DecodedImage),
}

/// Countdown text under the traffic light.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TimingDisplay {
    #[default]
    Idle,
    Calculating,
    Countdown { phase: LightPhase, seconds: u32 },
}

impl TimingDisplay {
    pub fn headline(&self) -> String {
        match self {
            TimingDisplay::Idle => "Select an image to calculate light timing".to_string(),
            TimingDisplay::Calculating => "Calculating optimal traffic light timing...".to_string(),
            TimingDisplay::Countdown { phase, seconds } => {
                format!("{} light: {} seconds", phase.label(), seconds)
            }
        }
    }

    pub fn note(&self) -> Option<&'static str> {
        match self {
            TimingDisplay::Countdown { .. } => Some(TIMING_NOTE),
            _ => None,
        }
    }
}

/// Single source of truth for everything the dashboard window shows.
///
/// Wrapped in `Arc<RwLock<_>>` by [`crate::state::StateManager`]; mutate it only
/// through the manager so that change events are emitted.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub gallery: GalleryView,
    /// Bumped whenever a catalog replaces the gallery.
    pub catalog_generation: u64,
    pub thumbnails: HashMap<ImageRef, DecodedImage>,

    pub selected: Option<ImageRef>,
    /// Bumped on every selection; continuations of older selections are dropped.
    pub generation: u64,

    pub results: ResultsPanel,
    /// False between rendering results and the end of the fade-in delay.
    pub results_revealed: bool,
    pub visualization: VisualizationPanel,

    pub timing: TimingDisplay,
    pub active_light: Option<LightPhase>,
}

impl DashboardState {
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Position of the selected entry in the gallery, if it is listed.
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.gallery.entries().iter().position(|image| image == selected)
    }

    pub fn loading_panel_mut(&mut self) -> Option<&mut LoadingPanel> {
        match &mut self.results {
            ResultsPanel::Loading(panel) => Some(panel),
            _ => None,
        }
    }
}
