// State management module
//
// This module provides the StateManager which wraps DashboardState with thread-safe access
// using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::dashboard_state::{LoadingPanel, VisualizationPanel};
use crate::models::{DashboardState, DecodedImage, GalleryView, ImageRef, LightPhase, ResultsPanel};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// The GUI controller listens for these and re-renders only the affected panel.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Gallery switched between loading, empty, error and entries
    GalleryChanged,

    /// One or more thumbnails were decoded
    ThumbnailsUpdated { count: usize },

    /// A different gallery entry is highlighted
    SelectionChanged { selected: Option<ImageRef> },

    /// Loading panel, results or error panel changed
    ResultsChanged,

    /// Fade-in state of the results panel flipped
    ResultsRevealed { revealed: bool },

    /// Visualization placeholder, pulse or image changed
    VisualizationChanged,

    /// Countdown text changed
    TimingChanged { headline: String },

    /// A different light indicator is lit
    LightChanged { active: Option<LightPhase> },
}

/// Thread-safe state manager with event emission
///
/// - [`read()`](Self::read) for reading state through a closure
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`update_if_current()`](Self::update_if_current) for continuations of a selection
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    state: Arc<RwLock<DashboardState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// The broadcast buffer holds 256 events; light ticks and dot pulses are frequent.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(DashboardState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    pub fn snapshot(&self) -> DashboardState {
        self.read(|state| state.clone())
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let generation = state_manager.read(|state| state.generation);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&DashboardState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies `update_fn`, diffs, and broadcasts one
    /// event per changed panel. Returns the emitted events.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut DashboardState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        Self::apply(&mut state, update_fn, &self.state_tx)
    }

    /// Update the state only if `generation` is still the latest selection
    ///
    /// The check and the mutation happen under one write lock, so a newer
    /// selection can never be overwritten by an older flow.
    ///
    /// # Returns
    /// `None` if the generation is stale and nothing was applied
    pub fn update_if_current<F>(&self, generation: u64, update_fn: F) -> Option<Vec<StateChange>>
    where
        F: FnOnce(&mut DashboardState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.is_current(generation) {
            return None;
        }
        Some(Self::apply(&mut state, update_fn, &self.state_tx))
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn apply<F>(
        state: &mut DashboardState,
        update_fn: F,
        state_tx: &broadcast::Sender<StateChange>,
    ) -> Vec<StateChange>
    where
        F: FnOnce(&mut DashboardState),
    {
        let old_state = state.clone();
        update_fn(state);

        let changes = Self::detect_changes(&old_state, state);
        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = state_tx.send(change.clone());
        }
        changes
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(old: &DashboardState, new: &DashboardState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.gallery != new.gallery {
            changes.push(StateChange::GalleryChanged);
        }

        if old.thumbnails != new.thumbnails {
            changes.push(StateChange::ThumbnailsUpdated {
                count: new.thumbnails.len(),
            });
        }

        if old.selected != new.selected {
            changes.push(StateChange::SelectionChanged {
                selected: new.selected.clone(),
            });
        }

        if old.results != new.results {
            changes.push(StateChange::ResultsChanged);
        }

        if old.results_revealed != new.results_revealed {
            changes.push(StateChange::ResultsRevealed {
                revealed: new.results_revealed,
            });
        }

        if old.visualization != new.visualization {
            changes.push(StateChange::VisualizationChanged);
        }

        if old.timing != new.timing {
            changes.push(StateChange::TimingChanged {
                headline: new.timing.headline(),
            });
        }

        if old.active_light != new.active_light {
            changes.push(StateChange::LightChanged {
                active: new.active_light,
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Replace the gallery and drop thumbnails of the previous catalog
    ///
    /// # Returns
    /// The new catalog generation, used to key thumbnail loads
    pub fn show_gallery(&self, gallery: GalleryView) -> u64 {
        let mut catalog_generation = 0;
        self.update(|state| {
            state.catalog_generation += 1;
            catalog_generation = state.catalog_generation;
            state.gallery = gallery;
            state.thumbnails.clear();
        });
        catalog_generation
    }

    /// Store a decoded thumbnail if its catalog is still the one on screen
    pub fn add_thumbnail(&self, catalog_generation: u64, image: ImageRef, thumbnail: DecodedImage) -> bool {
        let mut stored = false;
        self.update(|state| {
            if state.catalog_generation == catalog_generation {
                state.thumbnails.insert(image, thumbnail);
                stored = true;
            }
        });
        stored
    }

    /// Start a new selection: highlight it, show the loading panel and the
    /// visualization placeholder
    ///
    /// # Returns
    /// The generation number owned by this selection
    pub fn begin_selection(&self, image: ImageRef) -> u64 {
        let mut generation = 0;
        self.update(|state| {
            state.generation += 1;
            generation = state.generation;
            state.selected = Some(image.clone());
            state.results = ResultsPanel::Loading(LoadingPanel::new(image));
            state.results_revealed = true;
            state.visualization = VisualizationPanel::Generating { active_dot: 0 };
        });
        generation
    }

    /// Image named by the current error panel's retry action, if one is shown
    pub fn retry_target(&self) -> Option<ImageRef> {
        self.read(|state| match &state.results {
            ResultsPanel::Failed(panel) => Some(panel.retry.clone()),
            _ => None,
        })
    }

    pub fn current_generation(&self) -> u64 {
        self.read(|state| state.generation)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across tasks
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
