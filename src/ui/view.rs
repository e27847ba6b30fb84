//! Toolkit-independent projections of [`DashboardState`] onto the window's panels.
//!
//! Everything here is plain `Send` data so it can be computed on the state
//! subscription thread and shipped to the event loop, where the controller
//! turns it into Slint values.

use crate::models::{DashboardState, DecodedImage, LightPhase, ResultsPanel, VisualizationPanel};

/// One selectable gallery entry
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryRow {
    pub name: String,
    pub alt: String,
    pub selected: bool,
    pub thumbnail: Option<DecodedImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryPresentation {
    pub rows: Vec<GalleryRow>,
    /// Empty when rows are shown
    pub message: String,
    /// Row to scroll into view
    pub scroll_target: Option<usize>,
}

pub fn gallery(state: &DashboardState) -> GalleryPresentation {
    let rows = state
        .gallery
        .entries()
        .iter()
        .map(|image| GalleryRow {
            name: image.filename().to_string(),
            alt: image.alt_text(),
            selected: state.selected.as_ref() == Some(image),
            thumbnail: state.thumbnails.get(image).cloned(),
        })
        .collect();

    GalleryPresentation {
        rows,
        message: state.gallery.message().unwrap_or_default().to_string(),
        scroll_target: state.selected_index(),
    }
}

/// Which variant of the results panel is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultsMode {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl ResultsMode {
    /// Discriminant understood by `results-mode` in the window
    pub fn as_index(self) -> i32 {
        match self {
            ResultsMode::Idle => 0,
            ResultsMode::Loading => 1,
            ResultsMode::Ready => 2,
            ResultsMode::Error => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsPresentation {
    pub mode: ResultsMode,

    // loading
    pub active_step: usize,
    pub progress_percent: u8,
    pub progress_complete: bool,
    pub preview: Option<DecodedImage>,
    pub preview_name: String,

    // ready
    pub prediction: String,
    pub congestion_class: &'static str,
    pub vehicle_count: u32,
    pub lanes: Vec<(String, String)>,
    pub timing_rows: Vec<(String, String)>,

    // error
    pub error_message: String,
}

pub fn results(state: &DashboardState) -> ResultsPresentation {
    match &state.results {
        ResultsPanel::Idle => ResultsPresentation::default(),
        ResultsPanel::Loading(panel) => ResultsPresentation {
            mode: ResultsMode::Loading,
            active_step: panel.active_step,
            progress_percent: panel.fill_percent,
            progress_complete: panel.complete,
            preview: state.thumbnails.get(&panel.image).cloned(),
            preview_name: panel.image.filename().to_string(),
            ..ResultsPresentation::default()
        },
        ResultsPanel::Ready(view) => ResultsPresentation {
            mode: ResultsMode::Ready,
            prediction: view.prediction.clone(),
            congestion_class: view.congestion.style_class(),
            vehicle_count: view.vehicle_count,
            lanes: view.lane_rows(),
            timing_rows: view
                .timing_rows()
                .into_iter()
                .map(|(label, value)| (label.to_string(), value))
                .collect(),
            ..ResultsPresentation::default()
        },
        ResultsPanel::Failed(panel) => ResultsPresentation {
            mode: ResultsMode::Error,
            error_message: panel.message.clone(),
            ..ResultsPresentation::default()
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualizationPresentation {
    /// 0 placeholder, 1 generating, 2 image
    pub mode: i32,
    pub active_dot: usize,
    pub image: Option<DecodedImage>,
}

pub fn visualization(state: &DashboardState) -> VisualizationPresentation {
    match &state.visualization {
        VisualizationPanel::Idle => VisualizationPresentation::default(),
        VisualizationPanel::Generating { active_dot } => VisualizationPresentation {
            mode: 1,
            active_dot: *active_dot,
            image: None,
        },
        VisualizationPanel::Ready(image) => VisualizationPresentation {
            mode: 2,
            active_dot: 0,
            image: Some(image.clone()),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingPresentation {
    pub headline: String,
    pub note: String,
    pub green: bool,
    pub yellow: bool,
    pub red: bool,
}

pub fn timing(state: &DashboardState) -> TimingPresentation {
    let lit = |phase| state.active_light == Some(phase);
    TimingPresentation {
        headline: state.timing.headline(),
        note: state.timing.note().unwrap_or_default().to_string(),
        green: lit(LightPhase::Green),
        yellow: lit(LightPhase::Yellow),
        red: lit(LightPhase::Red),
    }
}
