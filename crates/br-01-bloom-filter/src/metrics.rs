//! Metrics for Bloom filter operations
//!
//! Counters are shared by the engines that build filters (sync) and the ones
//! that query them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::BloomFilter;

/// Thread-safe counters for filter builds and lookups
#[derive(Debug, Default)]
pub struct FilterMetrics {
    /// Total filters built
    pub filters_built: AtomicU64,
    /// Total items inserted across all built filters
    pub items_inserted: AtomicU64,
    /// Total bytes of packed bit arrays built
    pub bytes_allocated: AtomicU64,
    /// Total membership checks
    pub lookups: AtomicU64,
    /// Checks that answered "maybe present"
    pub positive_lookups: AtomicU64,
}

impl FilterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly built filter
    pub fn record_built(&self, filter: &BloomFilter) {
        self.filters_built.fetch_add(1, Ordering::Relaxed);
        self.items_inserted
            .fetch_add(filter.inserted_count() as u64, Ordering::Relaxed);
        self.bytes_allocated
            .fetch_add(filter.size_bits().div_ceil(8) as u64, Ordering::Relaxed);
    }

    /// Record a membership check
    pub fn record_lookup(&self, found: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if found {
            self.positive_lookups.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Ratio of positive checks to all checks.
    ///
    /// Includes true positives, so this is an upper bound on the observed FPR.
    pub fn observed_positive_rate(&self) -> f64 {
        let total = self.lookups.load(Ordering::Relaxed);
        let positive = self.positive_lookups.load(Ordering::Relaxed);
        if total > 0 {
            positive as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> FilterMetricsSnapshot {
        FilterMetricsSnapshot {
            filters_built: self.filters_built.load(Ordering::Relaxed),
            items_inserted: self.items_inserted.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            positive_lookups: self.positive_lookups.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.filters_built.store(0, Ordering::Relaxed);
        self.items_inserted.store(0, Ordering::Relaxed);
        self.bytes_allocated.store(0, Ordering::Relaxed);
        self.lookups.store(0, Ordering::Relaxed);
        self.positive_lookups.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterMetricsSnapshot {
    pub filters_built: u64,
    pub items_inserted: u64,
    pub bytes_allocated: u64,
    pub lookups: u64,
    pub positive_lookups: u64,
}
