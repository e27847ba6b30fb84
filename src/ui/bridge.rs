// EventLoopBridge - Coordinates between the tokio runtime and the Slint event loop
//
// Background tasks (HTTP calls, animation timers, light ticks) never touch Slint
// types directly. They queue closures here, and a handler thread forwards each
// one into the event loop with `upgrade_in_event_loop`.

use crate::metrics::Metrics;
use slint::{ComponentHandle, Weak};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Capacity of the UI update queue; light ticks and dot pulses are the busiest producers
pub const UI_UPDATE_CAPACITY: usize = 100;

type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Queue `update`, dropping it if the event loop is lagging
///
/// A dropped update raises `resync`; the window is stale until a full redraw.
///
/// # Returns
/// `true` if the update was queued
fn enqueue<T>(tx: &mpsc::Sender<UiUpdate<T>>, update: UiUpdate<T>, metrics: &Metrics, resync: &AtomicBool) -> bool {
    match tx.try_send(update) {
        Ok(()) => {
            metrics.record_ui_update();
            true
        }
        Err(mpsc::error::TrySendError::Full(_)) => {
            metrics.record_ui_channel_full();
            resync.store(true, Ordering::Release);
            tracing::warn!("UI update channel full - skipping update, full redraw pending");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::warn!("Failed to send UI update - handler thread has stopped");
            false
        }
    }
}

/// Coordinates between tokio async runtime and Slint event loop
///
/// - UI updates from background tasks via [`update_ui`](Self::update_ui)
/// - Async work from Slint callbacks via [`spawn_async`](Self::spawn_async)
///
/// # Example
/// ```ignore
/// let bridge = EventLoopBridge::new(&ui, runtime.handle().clone(), metrics);
/// let handle = bridge.clone_handle();
///
/// ui.on_image_selected(move |name| {
///     let handle = handle.clone();
///     handle.clone().spawn_async(move || async move {
///         let outcome = orchestrator.select_image(ImageRef::new(name.as_str())).await;
///         handle.update_ui(move |ui| ui.set_status(format!("{:?}", outcome).into()));
///     });
/// });
/// ```
pub struct EventLoopBridge<T: ComponentHandle> {
    handle: EventLoopBridgeHandle<T>,
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    /// Create a new EventLoopBridge
    ///
    /// Starts the handler thread that forwards queued updates into the event
    /// loop. The thread exits once every sender is dropped or the event loop
    /// has stopped.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle, metrics: Arc<Metrics>) -> Self {
        let ui_weak = ui.as_weak();
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<UiUpdate<T>>(UI_UPDATE_CAPACITY);

        let ui_weak_clone = ui_weak.clone();
        std::thread::Builder::new()
            .name("trafficdash-ui-bridge".to_string())
            .spawn(move || {
                tracing::debug!("EventLoopBridge handler thread started");

                while let Some(update_fn) = ui_update_rx.blocking_recv() {
                    let result = ui_weak_clone.upgrade_in_event_loop(move |ui| {
                        update_fn(&ui);
                    });

                    if let Err(e) = result {
                        // The event loop is gone; nothing left to update
                        tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                        break;
                    }
                }

                tracing::debug!("EventLoopBridge handler thread terminated");
            })
            .map_err(|e| tracing::error!("Failed to start EventLoopBridge thread: {}", e))
            .ok();

        Self {
            handle: EventLoopBridgeHandle {
                ui_weak,
                tokio_handle,
                ui_update_tx,
                metrics,
                resync: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    /// Schedule a UI update from any thread
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.handle.update_ui(update);
    }

    /// Spawn an async task on the tokio runtime from a Slint callback
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn_async(future_factory);
    }

    /// Cloneable handle for capturing in Slint callbacks and background threads
    pub fn clone_handle(&self) -> EventLoopBridgeHandle<T> {
        self.handle.clone()
    }
}

/// Lightweight handle that can be cloned and passed to callbacks
pub struct EventLoopBridgeHandle<T: ComponentHandle> {
    ui_weak: Weak<T>,
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,
    metrics: Arc<Metrics>,
    /// Set when an update was dropped
    resync: Arc<AtomicBool>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for EventLoopBridgeHandle<T> {
    fn clone(&self) -> Self {
        Self {
            ui_weak: self.ui_weak.clone(),
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
            metrics: Arc::clone(&self.metrics),
            resync: Arc::clone(&self.resync),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridgeHandle<T> {
    /// Schedule a UI update from any thread
    ///
    /// Updates are dropped (and counted) while the queue is full; see
    /// [`take_resync`](Self::take_resync).
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        enqueue(&self.ui_update_tx, Box::new(update), &self.metrics, &self.resync);
    }

    /// Whether an update was dropped since the last call
    ///
    /// Clears the flag. A `true` result means the caller should redraw every panel.
    pub fn take_resync(&self) -> bool {
        self.resync.swap(false, Ordering::AcqRel)
    }

    /// Spawn an async task on the tokio runtime
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }

    pub fn tokio_handle(&self) -> &tokio::runtime::Handle {
        &self.tokio_handle
    }

    pub fn ui_weak(&self) -> &Weak<T> {
        &self.ui_weak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A real component needs a windowing system, so the queueing logic is
    // exercised with a plain payload type instead.

    #[test]
    fn test_enqueue_counts_updates() {
        let metrics = Metrics::new();
        let resync = AtomicBool::new(false);
        let (tx, mut rx) = mpsc::channel::<UiUpdate<String>>(4);

        assert!(enqueue(&tx, Box::new(|s: &String| assert_eq!(s, "ui")), &metrics, &resync));
        assert!(!resync.load(Ordering::Acquire));
        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 1);

        let update = rx.try_recv().unwrap();
        update(&"ui".to_string());
    }

    #[test]
    fn test_enqueue_drops_when_full() {
        let metrics = Metrics::new();
        let resync = AtomicBool::new(false);
        let (tx, _rx) = mpsc::channel::<UiUpdate<String>>(1);

        assert!(enqueue(&tx, Box::new(|_: &String| {}), &metrics, &resync));
        assert!(!enqueue(&tx, Box::new(|_: &String| {}), &metrics, &resync));

        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.ui_update_channel_full.load(Ordering::Relaxed), 1);
        assert!(resync.load(Ordering::Acquire));
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let metrics = Metrics::new();
        let resync = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel::<UiUpdate<String>>(1);
        drop(rx);

        assert!(!enqueue(&tx, Box::new(|_: &String| {}), &metrics, &resync));
        assert_eq!(metrics.ui_update_channel_full.load(Ordering::Relaxed), 0);
        // Nothing to redraw into
        assert!(!resync.load(Ordering::Acquire));
    }
}
