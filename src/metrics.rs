// Performance metrics module
//
// Provides lightweight counters for backend traffic, stale-response handling and UI churn

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Dashboard metrics
///
/// Uses atomic operations for thread-safe tracking without locks.
/// Shared as `Arc<Metrics>` between services and the GUI bridge and
/// summarized on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Catalog requests that rendered a gallery (entries or empty state)
    pub catalog_loads: AtomicU64,

    /// Catalog requests that failed
    pub catalog_failures: AtomicU64,

    /// Analysis requests issued
    pub analyses_requested: AtomicU64,

    /// Analyses rendered as results
    pub analyses_completed: AtomicU64,

    /// Analyses rendered as error panels
    pub analyses_failed: AtomicU64,

    /// Responses or timers discarded because a newer selection was made
    pub stale_discarded: AtomicU64,

    /// Total analysis round-trip time in milliseconds
    pub total_analysis_time_ms: AtomicU64,

    /// Light-cycle ticks processed
    pub light_ticks: AtomicU64,

    /// Number of UI updates sent
    pub ui_updates: AtomicU64,

    /// Number of UI update channel full errors
    pub ui_update_channel_full: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            catalog_loads: AtomicU64::new(0),
            catalog_failures: AtomicU64::new(0),
            analyses_requested: AtomicU64::new(0),
            analyses_completed: AtomicU64::new(0),
            analyses_failed: AtomicU64::new(0),
            stale_discarded: AtomicU64::new(0),
            total_analysis_time_ms: AtomicU64::new(0),
            light_ticks: AtomicU64::new(0),
            ui_updates: AtomicU64::new(0),
            ui_update_channel_full: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_catalog_load(&self) {
        self.catalog_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_catalog_failure(&self) {
        self.catalog_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis_requested(&self) {
        self.analyses_requested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rendered analysis and its round-trip time
    pub fn record_analysis_completed(&self, duration: Duration) {
        self.analyses_completed.fetch_add(1, Ordering::Relaxed);
        self.total_analysis_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_analysis_failed(&self) {
        self.analyses_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_discarded(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_light_tick(&self) {
        self.light_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_channel_full(&self) {
        self.ui_update_channel_full.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average round-trip time of completed analyses in milliseconds
    pub fn avg_analysis_time_ms(&self) -> f64 {
        let total = self.total_analysis_time_ms.load(Ordering::Relaxed);
        let count = self.analyses_completed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Dashboard Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Catalog: {} loads, {} failures",
            self.catalog_loads.load(Ordering::Relaxed),
            self.catalog_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Analyses: {} requested, {} completed, {} failed, {} stale discarded (avg: {:.2}ms)",
            self.analyses_requested.load(Ordering::Relaxed),
            self.analyses_completed.load(Ordering::Relaxed),
            self.analyses_failed.load(Ordering::Relaxed),
            self.stale_discarded.load(Ordering::Relaxed),
            self.avg_analysis_time_ms()
        );
        tracing::info!(
            "Light ticks: {}, UI updates: {}, channel full errors: {}",
            self.light_ticks.load(Ordering::Relaxed),
            self.ui_updates.load(Ordering::Relaxed),
            self.ui_update_channel_full.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.analyses_requested.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.stale_discarded.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_analysis_outcomes() {
        let metrics = Metrics::new();

        metrics.record_analysis_requested();
        metrics.record_analysis_requested();
        metrics.record_analysis_completed(Duration::from_millis(100));
        metrics.record_analysis_failed();

        assert_eq!(metrics.analyses_requested.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.analyses_completed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.analyses_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_avg_analysis_time() {
        let metrics = Metrics::new();

        metrics.record_analysis_completed(Duration::from_millis(100));
        metrics.record_analysis_completed(Duration::from_millis(200));

        assert_eq!(metrics.total_analysis_time_ms.load(Ordering::Relaxed), 300);
        assert_eq!(metrics.avg_analysis_time_ms(), 150.0);
    }

    #[test]
    fn test_avg_analysis_time_no_analyses() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_analysis_time_ms(), 0.0);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }

    #[test]
    fn test_ui_counters() {
        let metrics = Metrics::new();

        metrics.record_ui_update();
        metrics.record_ui_channel_full();
        metrics.record_light_tick();
        metrics.record_stale_discarded();

        assert_eq!(metrics.ui_updates.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.ui_update_channel_full.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.light_ticks.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.stale_discarded.load(Ordering::Relaxed), 1);
    }
}
