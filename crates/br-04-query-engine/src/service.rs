//! # Query Engine Service
//!
//! Answers "who in my follow set blocks, or is blocked by, this account"
//! from the persisted cache. Exact entries answer directly. Filter hits are
//! confirmed against the live block list before they are reported.

use std::sync::Arc;

use async_trait::async_trait;
use br_02_cache_store::{Cache, CacheStore, KeyValueStore};
use futures::future::join_all;
use shared_types::{fetch_block_list, Did, FollowedUser, GraphApi};
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::domain::{find_blocking, scan_blocked_by, BlockingInfo};
use crate::error::QueryError;
use crate::metrics::{QueryMetrics, QueryMetricsSnapshot};
use crate::ports::QueryEngineApi;

/// Query Engine - read-only view over the cache.
pub struct QueryEngine<S, G>
where
    S: KeyValueStore,
    G: GraphApi + ?Sized,
{
    store: Arc<CacheStore<S>>,
    graph: Arc<G>,
    config: QueryConfig,
    metrics: Arc<QueryMetrics>,
}

impl<S, G> QueryEngine<S, G>
where
    S: KeyValueStore,
    G: GraphApi + ?Sized,
{
    pub fn new(
        store: Arc<CacheStore<S>>,
        graph: Arc<G>,
        config: QueryConfig,
    ) -> Result<Self, QueryError> {
        config.validate()?;
        Ok(Self {
            store,
            graph,
            config,
            metrics: Arc::new(QueryMetrics::new()),
        })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn metrics_handle(&self) -> Arc<QueryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Relationships between the follow set and `profile_id`.
    ///
    /// Answers empty, not an error, while nobody is logged in or no cache
    /// for the logged-in identity exists yet. Candidates whose verification
    /// fetch fails are left out.
    pub async fn lookup_blocking_info(
        &self,
        profile_id: &str,
        profile_blocks: &[Did],
    ) -> Result<BlockingInfo, QueryError> {
        QueryMetrics::add(&self.metrics.lookups, 1);

        let Some(cache) = self.current_cache()? else {
            QueryMetrics::add(&self.metrics.empty_cache_lookups, 1);
            debug!(profile = %profile_id, "No cache for the current identity, answering empty");
            return Ok(BlockingInfo::default());
        };

        let threshold = self.config.hash_set_threshold;
        let scan = scan_blocked_by(&cache, profile_id, threshold);
        QueryMetrics::add(&self.metrics.exact_matches, scan.confirmed.len());
        QueryMetrics::add(&self.metrics.candidates, scan.candidates.len());

        let mut blocked_by: Vec<FollowedUser> = scan.confirmed.into_iter().cloned().collect();
        if !scan.candidates.is_empty() {
            blocked_by.extend(self.verify_candidates(profile_id, &scan.candidates).await);
        }
        let blocking = find_blocking(&cache, profile_blocks, threshold);

        debug!(
            profile = %profile_id,
            blocked_by = blocked_by.len(),
            blocking = blocking.len(),
            "Blocking info resolved"
        );
        Ok(BlockingInfo {
            blocked_by,
            blocking,
            last_full_sync_at: cache.last_full_sync_at,
        })
    }

    fn current_cache(&self) -> Result<Option<Cache>, QueryError> {
        let Some(auth) = self.store.auth()? else {
            return Ok(None);
        };
        Ok(self
            .store
            .load_cache()?
            .filter(|cache| cache.owner_id == auth.owner_id))
    }

    /// Keep the candidates whose live block list contains `profile_id`.
    async fn verify_candidates(
        &self,
        profile_id: &str,
        candidates: &[&FollowedUser],
    ) -> Vec<FollowedUser> {
        let mut confirmed = Vec::new();
        for chunk in candidates.chunks(self.config.verify_concurrency) {
            let results = join_all(
                chunk
                    .iter()
                    .map(|user| fetch_block_list(&*self.graph, &user.did)),
            )
            .await;

            for (user, result) in chunk.iter().zip(results) {
                match result {
                    Ok(blocks) if blocks.iter().any(|b| b == profile_id) => {
                        QueryMetrics::add(&self.metrics.confirmed, 1);
                        confirmed.push((*user).clone());
                    }
                    Ok(_) => {
                        QueryMetrics::add(&self.metrics.false_positives, 1);
                        debug!(user = %user.handle, profile = %profile_id, "Discarded filter false positive");
                    }
                    Err(e) => {
                        QueryMetrics::add(&self.metrics.verification_failures, 1);
                        warn!(user = %user.handle, error = %e, "Candidate verification failed, leaving it out");
                    }
                }
            }
        }
        confirmed
    }
}

#[async_trait]
impl<S, G> QueryEngineApi for QueryEngine<S, G>
where
    S: KeyValueStore + 'static,
    G: GraphApi + ?Sized + 'static,
{
    async fn lookup_blocking_info(
        &self,
        profile_id: &str,
        profile_blocks: &[Did],
    ) -> Result<BlockingInfo, QueryError> {
        QueryEngine::lookup_blocking_info(self, profile_id, profile_blocks).await
    }

    fn metrics(&self) -> QueryMetricsSnapshot {
        self.metrics.snapshot()
    }
}
