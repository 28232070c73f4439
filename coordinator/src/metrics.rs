//! Metrics collection for refresh monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Refresh metrics.
pub struct Metrics {
    /// Total refreshes started.
    pub refreshes_total: AtomicU64,
    /// Refreshes that committed.
    pub refreshes_success: AtomicU64,
    /// Refreshes aborted because a source was unavailable.
    pub refreshes_source_failed: AtomicU64,
    /// Refreshes rolled back because the store failed.
    pub refreshes_persistence_failed: AtomicU64,
    /// Refreshes in progress.
    pub refreshes_active: AtomicU64,
    /// Summary renders that failed after a successful commit.
    pub summary_render_failed: AtomicU64,
    /// Countries written by the last successful refresh.
    pub countries_written_last: AtomicU64,
    /// Raw entries skipped by the last successful refresh.
    pub countries_skipped_last: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            refreshes_total: AtomicU64::new(0),
            refreshes_success: AtomicU64::new(0),
            refreshes_source_failed: AtomicU64::new(0),
            refreshes_persistence_failed: AtomicU64::new(0),
            refreshes_active: AtomicU64::new(0),
            summary_render_failed: AtomicU64::new(0),
            countries_written_last: AtomicU64::new(0),
            countries_skipped_last: AtomicU64::new(0),
        }
    }

    /// Record refresh started.
    pub fn refresh_started(&self) {
        self.refreshes_total.fetch_add(1, Ordering::Relaxed);
        self.refreshes_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record refresh committed.
    pub fn refresh_succeeded(&self, written: usize, skipped: usize) {
        self.refreshes_success.fetch_add(1, Ordering::Relaxed);
        self.refreshes_active.fetch_sub(1, Ordering::Relaxed);
        self.countries_written_last.store(written as u64, Ordering::Relaxed);
        self.countries_skipped_last.store(skipped as u64, Ordering::Relaxed);
    }

    /// Record refresh aborted on a source failure.
    pub fn refresh_source_failed(&self) {
        self.refreshes_source_failed.fetch_add(1, Ordering::Relaxed);
        self.refreshes_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record refresh rolled back on a store failure.
    pub fn refresh_persistence_failed(&self) {
        self.refreshes_persistence_failed.fetch_add(1, Ordering::Relaxed);
        self.refreshes_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record summary render failure.
    pub fn summary_failed(&self) {
        self.summary_render_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refreshes_total: self.refreshes_total.load(Ordering::Relaxed),
            refreshes_success: self.refreshes_success.load(Ordering::Relaxed),
            refreshes_source_failed: self.refreshes_source_failed.load(Ordering::Relaxed),
            refreshes_persistence_failed: self
                .refreshes_persistence_failed
                .load(Ordering::Relaxed),
            refreshes_active: self.refreshes_active.load(Ordering::Relaxed),
            summary_render_failed: self.summary_render_failed.load(Ordering::Relaxed),
            countries_written_last: self.countries_written_last.load(Ordering::Relaxed),
            countries_skipped_last: self.countries_skipped_last.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP countrycache_refreshes_total Total number of refreshes started
# TYPE countrycache_refreshes_total counter
countrycache_refreshes_total {}

# HELP countrycache_refreshes_success Total committed refreshes
# TYPE countrycache_refreshes_success counter
countrycache_refreshes_success {}

# HELP countrycache_refreshes_source_failed Total refreshes aborted by an unavailable source
# TYPE countrycache_refreshes_source_failed counter
countrycache_refreshes_source_failed {}

# HELP countrycache_refreshes_persistence_failed Total refreshes rolled back by the store
# TYPE countrycache_refreshes_persistence_failed counter
countrycache_refreshes_persistence_failed {}

# HELP countrycache_refreshes_active Current refreshes in progress
# TYPE countrycache_refreshes_active gauge
countrycache_refreshes_active {}

# HELP countrycache_summary_render_failed Total failed summary renders
# TYPE countrycache_summary_render_failed counter
countrycache_summary_render_failed {}

# HELP countrycache_countries_written_last Countries written by the last refresh
# TYPE countrycache_countries_written_last gauge
countrycache_countries_written_last {}

# HELP countrycache_countries_skipped_last Directory entries skipped by the last refresh
# TYPE countrycache_countries_skipped_last gauge
countrycache_countries_skipped_last {}
"#,
            snapshot.refreshes_total,
            snapshot.refreshes_success,
            snapshot.refreshes_source_failed,
            snapshot.refreshes_persistence_failed,
            snapshot.refreshes_active,
            snapshot.summary_render_failed,
            snapshot.countries_written_last,
            snapshot.countries_skipped_last,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub refreshes_total: u64,
    pub refreshes_success: u64,
    pub refreshes_source_failed: u64,
    pub refreshes_persistence_failed: u64,
    pub refreshes_active: u64,
    pub summary_render_failed: u64,
    pub countries_written_last: u64,
    pub countries_skipped_last: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
