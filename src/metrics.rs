// Discard metrics module
//
// Lightweight counters for monitoring what the discard engine did

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Engine-wide discard metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Shared behind an `Arc` between the workflow and whoever wants to report on it,
/// and logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Items whose removal was verified
    pub items_discarded: AtomicUsize,

    /// Confirmation dialogs clicked
    pub dialogs_confirmed: AtomicUsize,

    /// Targets that changed before their dialog appeared
    pub stale_targets: AtomicUsize,

    /// Discards refused because the target was blacklisted
    pub refused_targets: AtomicUsize,

    pub runs_completed: AtomicUsize,
    pub runs_failed: AtomicUsize,
    pub runs_aborted: AtomicUsize,

    /// Runs that failed because the deadline passed
    pub timeouts: AtomicUsize,

    /// Time spent in finished runs, in milliseconds
    pub total_run_time_ms: AtomicU64,

    /// Number of state broadcasts sent
    pub state_broadcasts: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            items_discarded: AtomicUsize::new(0),
            dialogs_confirmed: AtomicUsize::new(0),
            stale_targets: AtomicUsize::new(0),
            refused_targets: AtomicUsize::new(0),
            runs_completed: AtomicUsize::new(0),
            runs_failed: AtomicUsize::new(0),
            runs_aborted: AtomicUsize::new(0),
            timeouts: AtomicUsize::new(0),
            total_run_time_ms: AtomicU64::new(0),
            state_broadcasts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_item_discarded(&self) {
        self.items_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dialog_confirmed(&self) {
        self.dialogs_confirmed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_target(&self) {
        self.stale_targets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refused_target(&self) {
        self.refused_targets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_completed(&self, duration: Duration) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration);
    }

    pub fn record_run_failed(&self, duration: Duration) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration);
    }

    pub fn record_run_aborted(&self) {
        self.runs_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_state_broadcasts(&self, count: usize) {
        self.state_broadcasts
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    fn record_run_time(&self, duration: Duration) {
        self.total_run_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average time of a finished run in milliseconds
    pub fn avg_run_time_ms(&self) -> f64 {
        let total = self.total_run_time_ms.load(Ordering::Relaxed);
        let count = self.runs_completed.load(Ordering::Relaxed)
            + self.runs_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Discard Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Runs: {} completed, {} failed ({} timed out), {} aborted",
            self.runs_completed.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed),
            self.timeouts.load(Ordering::Relaxed),
            self.runs_aborted.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Items: {} discarded, {} dialogs confirmed, {} stale targets, {} refused",
            self.items_discarded.load(Ordering::Relaxed),
            self.dialogs_confirmed.load(Ordering::Relaxed),
            self.stale_targets.load(Ordering::Relaxed),
            self.refused_targets.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total run time: {:.2}s (avg: {:.2}ms per run)",
            self.total_run_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_run_time_ms()
        );
        tracing::info!(
            "State broadcasts: {}",
            self.state_broadcasts.load(Ordering::Relaxed)
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
        assert_eq!(metrics.items_discarded.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.runs_failed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_item_operations() {
        let metrics = Metrics::new();

        metrics.record_item_discarded();
        metrics.record_item_discarded();
        metrics.record_dialog_confirmed();
        metrics.record_stale_target();
        metrics.record_refused_target();
        metrics.record_state_broadcasts(3);

        assert_eq!(metrics.items_discarded.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.dialogs_confirmed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.stale_targets.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.refused_targets.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.state_broadcasts.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_run_time_average() {
        let metrics = Metrics::new();

        metrics.record_run_completed(Duration::from_millis(100));
        metrics.record_run_failed(Duration::from_millis(200));
        metrics.record_run_aborted();

        assert_eq!(metrics.total_run_time_ms.load(Ordering::Relaxed), 300);
        assert_eq!(metrics.avg_run_time_ms(), 150.0);
        assert_eq!(metrics.runs_aborted.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_avg_run_time_no_runs() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_run_time_ms(), 0.0);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
