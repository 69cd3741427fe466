//! # Inbound Ports

use async_trait::async_trait;
use shared_types::Did;

use crate::domain::BlockingInfo;
use crate::error::QueryError;
use crate::metrics::QueryMetricsSnapshot;

/// Query Engine API - inbound port.
#[async_trait]
pub trait QueryEngineApi: Send + Sync {
    /// Relationships between the follow set and `profile_id`.
    ///
    /// `profile_blocks` is the viewed account's own block list, fetched by
    /// the caller. Answers empty when no cache exists yet.
    async fn lookup_blocking_info(
        &self,
        profile_id: &str,
        profile_blocks: &[Did],
    ) -> Result<BlockingInfo, QueryError>;

    /// Counters since startup.
    fn metrics(&self) -> QueryMetricsSnapshot;
}
