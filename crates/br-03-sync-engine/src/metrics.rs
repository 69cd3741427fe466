//! # Sync Metrics
//!
//! Lock-free counters over every pass this process ran.

use std::sync::atomic::{AtomicU64, Ordering};

use br_01_bloom_filter::{FilterMetrics, FilterMetricsSnapshot};
use serde::{Deserialize, Serialize};

/// Counters for sync passes.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Passes that asked for the lease.
    pub passes_started: AtomicU64,
    /// Passes that ran to the end.
    pub passes_completed: AtomicU64,
    /// Passes skipped (lease busy or not logged in).
    pub passes_skipped: AtomicU64,
    /// Passes aborted by an error.
    pub passes_failed: AtomicU64,
    /// Expired leases taken over.
    pub stale_locks_reclaimed: AtomicU64,
    /// Block lists fetched successfully.
    pub users_fetched: AtomicU64,
    /// Block-list fetches that failed.
    pub user_fetch_failures: AtomicU64,
    /// Successful cache writes.
    pub persists: AtomicU64,
    /// Cache writes that failed even after eviction.
    pub persist_failures: AtomicU64,
    /// Status writes that failed mid-pass.
    pub status_write_failures: AtomicU64,
    /// Eviction runs that removed something.
    pub evictions: AtomicU64,
    /// Entries removed by eviction.
    pub entries_evicted: AtomicU64,
    /// Filters built for the probabilistic profile.
    pub filters: FilterMetrics,
}

impl SyncMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self, removed: usize) {
        if removed > 0 {
            Self::incr(&self.evictions);
            self.entries_evicted
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        SyncMetricsSnapshot {
            passes_started: load(&self.passes_started),
            passes_completed: load(&self.passes_completed),
            passes_skipped: load(&self.passes_skipped),
            passes_failed: load(&self.passes_failed),
            stale_locks_reclaimed: load(&self.stale_locks_reclaimed),
            users_fetched: load(&self.users_fetched),
            user_fetch_failures: load(&self.user_fetch_failures),
            persists: load(&self.persists),
            persist_failures: load(&self.persist_failures),
            status_write_failures: load(&self.status_write_failures),
            evictions: load(&self.evictions),
            entries_evicted: load(&self.entries_evicted),
            filters: self.filters.snapshot(),
        }
    }
}

/// Point-in-time copy of [`SyncMetrics`].
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub passes_started: u64,
    pub passes_completed: u64,
    pub passes_skipped: u64,
    pub passes_failed: u64,
    pub stale_locks_reclaimed: u64,
    pub users_fetched: u64,
    pub user_fetch_failures: u64,
    pub persists: u64,
    pub persist_failures: u64,
    pub status_write_failures: u64,
    pub evictions: u64,
    pub entries_evicted: u64,
    pub filters: FilterMetricsSnapshot,
}
