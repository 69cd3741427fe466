//! # Inbound Ports
//!
//! API trait defining what the Sync Engine can do.

use async_trait::async_trait;
use br_02_cache_store::SyncStatus;

use crate::domain::{SyncError, SyncOutcome, SyncPhase};
use crate::metrics::SyncMetricsSnapshot;

/// Sync Engine API - inbound port.
#[async_trait]
pub trait SyncEngineApi: Send + Sync {
    /// Run one full synchronization pass, or skip it if another holds the lease.
    async fn run_sync(&self) -> Result<SyncOutcome, SyncError>;

    /// True if the stored cache should be rebuilt right away.
    fn needs_initial_sync(&self) -> Result<bool, SyncError>;

    /// Persisted progress and lease record.
    fn status(&self) -> Result<SyncStatus, SyncError>;

    /// Phase of the pass running in this process.
    fn phase(&self) -> SyncPhase;

    /// Counters since startup.
    fn metrics(&self) -> SyncMetricsSnapshot;
}
