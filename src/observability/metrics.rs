//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Operational counters for fetches, saves and live streams
///
/// All counters use Relaxed ordering; readers see eventually consistent values.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    fetches_executed: AtomicU64,
    fetches_failed: AtomicU64,
    records_fetched: AtomicU64,
    saves: AtomicU64,
    save_failures: AtomicU64,
    validation_rejections: AtomicU64,
    unique_violations: AtomicU64,
    snapshots_delivered: AtomicU64,
    snapshots_deferred: AtomicU64,
    refetch_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Queries

    /// Record a successful fetch returning `records` records
    pub fn record_fetch(&self, records: usize) {
        self.fetches_executed.fetch_add(1, Ordering::Relaxed);
        self.records_fetched
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn increment_fetches_failed(&self) {
        self.fetches_failed.fetch_add(1, Ordering::Relaxed);
    }

    // Writes

    pub fn increment_saves(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_save_failures(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validation_rejections(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unique_violations(&self) {
        self.unique_violations.fetch_add(1, Ordering::Relaxed);
    }

    // Live streams

    pub fn increment_snapshots_delivered(&self) {
        self.snapshots_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshots_deferred(&self) {
        self.snapshots_deferred.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_refetch_failures(&self) {
        self.refetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetches_executed: self.fetches_executed.load(Ordering::Relaxed),
            fetches_failed: self.fetches_failed.load(Ordering::Relaxed),
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            unique_violations: self.unique_violations.load(Ordering::Relaxed),
            snapshots_delivered: self.snapshots_delivered.load(Ordering::Relaxed),
            snapshots_deferred: self.snapshots_deferred.load(Ordering::Relaxed),
            refetch_failures: self.refetch_failures.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the counters at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub fetches_executed: u64,
    pub fetches_failed: u64,
    pub records_fetched: u64,
    pub saves: u64,
    pub save_failures: u64,
    pub validation_rejections: u64,
    pub unique_violations: u64,
    pub snapshots_delivered: u64,
    pub snapshots_deferred: u64,
    pub refetch_failures: u64,
}

/// Process-wide registry
pub fn metrics() -> &'static MetricsRegistry {
    static REGISTRY: OnceLock<MetricsRegistry> = OnceLock::new();
    REGISTRY.get_or_init(MetricsRegistry::new)
}
