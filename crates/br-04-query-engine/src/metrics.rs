//! # Query Metrics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters over every lookup this process answered.
#[derive(Debug, Default)]
pub struct QueryMetrics {
    pub lookups: AtomicU64,
    /// Lookups answered empty because no usable cache existed.
    pub empty_cache_lookups: AtomicU64,
    pub exact_matches: AtomicU64,
    /// Filter hits sent to verification.
    pub candidates: AtomicU64,
    /// Candidates confirmed by the live block list.
    pub confirmed: AtomicU64,
    /// Candidates the live block list did not contain.
    pub false_positives: AtomicU64,
    /// Candidates dropped because the live fetch failed.
    pub verification_failures: AtomicU64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Share of verified candidates that turned out to be false positives.
    pub fn false_positive_ratio(&self) -> f64 {
        let fp = self.false_positives.load(Ordering::Relaxed);
        let ok = self.confirmed.load(Ordering::Relaxed);
        if fp + ok == 0 {
            0.0
        } else {
            fp as f64 / (fp + ok) as f64
        }
    }

    pub fn snapshot(&self) -> QueryMetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        QueryMetricsSnapshot {
            lookups: load(&self.lookups),
            empty_cache_lookups: load(&self.empty_cache_lookups),
            exact_matches: load(&self.exact_matches),
            candidates: load(&self.candidates),
            confirmed: load(&self.confirmed),
            false_positives: load(&self.false_positives),
            verification_failures: load(&self.verification_failures),
        }
    }
}

/// Point-in-time copy of [`QueryMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetricsSnapshot {
    pub lookups: u64,
    pub empty_cache_lookups: u64,
    pub exact_matches: u64,
    pub candidates: u64,
    pub confirmed: u64,
    pub false_positives: u64,
    pub verification_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_false_positive_ratio() {
        let metrics = QueryMetrics::new();
        assert_eq!(metrics.false_positive_ratio(), 0.0);

        QueryMetrics::add(&metrics.confirmed, 3);
        QueryMetrics::add(&metrics.false_positives, 1);

        assert!((metrics.false_positive_ratio() - 0.25).abs() < f64::EPSILON);
        assert_eq!(metrics.snapshot().confirmed, 3);
    }
}
