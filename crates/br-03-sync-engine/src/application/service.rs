//! # Sync Engine Service
//!
//! Runs one full synchronization pass:
//!
//! 1. Take the lease (skip if a live pass holds it, reclaim it if stale).
//! 2. Load the identity; skip silently when nobody is logged in. Load the
//!    cache, discarding one pinned to another identity or profile.
//! 3. Evict proactively when the cache is already near its ceiling.
//! 4. Enumerate follows, replacing the follow list.
//! 5. Fetch block lists chunk by chunk, persisting every N chunks and after
//!    the last one, pausing between chunks.
//! 6. Answer a quota failure with eviction and one retry.
//! 7. Prune unfollowed entries, persist, release the lease.

use std::sync::Arc;

use async_trait::async_trait;
use br_02_cache_store::{
    evict_to_fit, BlockSet, Cache, CacheStore, KeyValueStore, StatusUpdate, SyncStatus,
};
use parking_lot::RwLock;
use shared_types::{GraphApi, Timestamp};
use tracing::{debug, error, info, warn};

use crate::algorithms::{build_entry, describe_failure, enumerate_follows, fetch_chunk, EntryUpdate};
use crate::config::SyncConfig;
use crate::domain::{
    needs_initial_sync, try_acquire, LeaseDecision, SkipReason, SyncError, SyncOutcome, SyncPhase,
    SyncReport,
};
use crate::metrics::{SyncMetrics, SyncMetricsSnapshot};
use crate::ports::SyncEngineApi;

/// Mutable bookkeeping of one pass.
#[derive(Default)]
struct PassState {
    synced: usize,
    errors: Vec<String>,
    evicted: usize,
}

/// Sync Engine - owns all cache writes during a pass.
pub struct SyncEngine<S, G>
where
    S: KeyValueStore,
    G: GraphApi + ?Sized,
{
    store: Arc<CacheStore<S>>,
    graph: Arc<G>,
    config: SyncConfig,
    metrics: Arc<SyncMetrics>,
    phase: RwLock<SyncPhase>,
}

impl<S, G> SyncEngine<S, G>
where
    S: KeyValueStore,
    G: GraphApi + ?Sized,
{
    /// Create a sync engine over `store` and `graph`.
    pub fn new(
        store: Arc<CacheStore<S>>,
        graph: Arc<G>,
        config: SyncConfig,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self {
            store,
            graph,
            config,
            metrics: Arc::new(SyncMetrics::new()),
            phase: RwLock::new(SyncPhase::Idle),
        })
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The cache store the engine writes to.
    pub fn store(&self) -> &Arc<CacheStore<S>> {
        &self.store
    }

    /// Shared handle to the live counters.
    pub fn metrics_handle(&self) -> Arc<SyncMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Phase of the pass running in this process.
    pub fn phase(&self) -> SyncPhase {
        *self.phase.read()
    }

    fn set_phase(&self, next: SyncPhase) {
        let mut phase = self.phase.write();
        if !phase.can_transition_to(&next) {
            warn!(from = %*phase, to = %next, "Unexpected sync phase transition");
        }
        debug!(from = %*phase, to = %next, "Sync phase");
        *phase = next;
    }

    /// Run one full synchronization pass.
    ///
    /// Lock contention and a missing identity are reported as
    /// [`SyncOutcome::Skipped`]. Only a failed enumeration or an unexpected
    /// store failure is an error; the lease is released either way.
    pub async fn run_sync(&self) -> Result<SyncOutcome, SyncError> {
        SyncMetrics::incr(&self.metrics.passes_started);
        let started_at = self.store.now();
        let stale_timeout = self.config.stale_timeout();

        let decision = self
            .store
            .modify_status(|status| try_acquire(status, started_at, stale_timeout))?;

        let reclaimed_stale = match decision {
            LeaseDecision::Busy { heartbeat_age_ms } => {
                info!(heartbeat_age_ms, "Sync already running, skipping");
                SyncMetrics::incr(&self.metrics.passes_skipped);
                return Ok(SyncOutcome::Skipped(SkipReason::AlreadyRunning {
                    heartbeat_age_ms,
                }));
            }
            LeaseDecision::Acquired { reclaimed_stale } => reclaimed_stale,
        };

        if reclaimed_stale {
            warn!("Reclaimed stale sync lock");
            SyncMetrics::incr(&self.metrics.stale_locks_reclaimed);
        } else {
            debug!("Sync lock acquired");
        }
        self.set_phase(SyncPhase::Locked);

        let result = self.run_locked(started_at, reclaimed_stale).await;
        self.set_phase(SyncPhase::Idle);

        match result {
            Ok(outcome) => {
                let counter = match &outcome {
                    SyncOutcome::Completed(_) => &self.metrics.passes_completed,
                    SyncOutcome::Skipped(_) => &self.metrics.passes_skipped,
                };
                SyncMetrics::incr(counter);
                Ok(outcome)
            }
            Err(e) => {
                SyncMetrics::incr(&self.metrics.passes_failed);
                error!(error = %e, "Sync pass aborted");
                if let Err(release) = self.release_with_error(&e) {
                    error!(error = %release, "Failed to release sync lock");
                }
                Err(e)
            }
        }
    }

    async fn run_locked(
        &self,
        started_at: Timestamp,
        reclaimed_stale: bool,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(auth) = self.store.auth()? else {
            info!("Not authenticated, skipping sync");
            self.store
                .update_status(StatusUpdate::default().with_running(false))?;
            return Ok(SyncOutcome::Skipped(SkipReason::NotAuthenticated));
        };
        let owner = auth.owner_id;

        let mut cache = self.store.load_cache_for(&owner, self.config.profile)?;
        let first_sync = needs_initial_sync(Some(&cache), &self.config);
        let mut pass = PassState::default();

        self.evict_proactively(&mut cache, &mut pass)?;

        // Enumeration
        self.set_phase(SyncPhase::Enumerating);
        let follows = enumerate_follows(&*self.graph, &owner, self.config.page_delay())
            .await
            .map_err(SyncError::Enumeration)?;
        let total = follows.len();
        info!(owner = %owner, follows = total, first_sync, "Follow list enumerated");
        cache.followed_users = follows.clone();
        self.heartbeat(StatusUpdate::progress(total, 0), &mut pass);

        // Batched fetch
        let chunk_size = self.config.chunk_size;
        let chunks = total.div_ceil(chunk_size);
        for (idx, chunk) in follows.chunks(chunk_size).enumerate() {
            self.set_phase(SyncPhase::Fetching { chunk: idx, chunks });
            let now = self.store.now();

            for fetch in fetch_chunk(&*self.graph, chunk).await {
                match fetch.result {
                    Ok(blocks) => {
                        pass.synced += 1;
                        SyncMetrics::incr(&self.metrics.users_fetched);
                        self.apply_fetched(&mut cache, &fetch.user.did, blocks, now);
                    }
                    Err(e) => {
                        warn!(user = %fetch.user.handle, did = %fetch.user.did, error = %e, "Block list fetch failed");
                        SyncMetrics::incr(&self.metrics.user_fetch_failures);
                        pass.errors.push(describe_failure(fetch.user, &e));
                    }
                }
            }

            let update =
                StatusUpdate::progress(total, pass.synced).with_errors(pass.errors.clone());
            self.heartbeat(update, &mut pass);

            let is_last = idx + 1 == chunks;
            if is_last || (idx + 1) % self.config.persist_every_chunks == 0 {
                self.persist(&mut cache, &mut pass);
            }
            debug!(chunk = idx + 1, chunks, synced = pass.synced, "Chunk processed");

            let delay = self.config.chunk_delay();
            if !is_last && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        // Finalization
        self.set_phase(SyncPhase::Finalizing);
        let pruned = cache.prune_unfollowed();
        let finished_at = self.store.now();
        cache.last_full_sync_at = Some(finished_at);
        self.persist(&mut cache, &mut pass);

        let update = StatusUpdate::progress(total, pass.synced)
            .with_errors(pass.errors.clone())
            .with_last_sync_at(finished_at)
            .with_running(false);
        self.heartbeat(update, &mut pass);

        let report = SyncReport {
            owner_id: owner,
            total_follows: total,
            synced_follows: pass.synced,
            entries_stored: cache.block_sets.len(),
            entries_pruned: pruned,
            entries_evicted: pass.evicted,
            errors: pass.errors,
            first_sync,
            reclaimed_stale_lock: reclaimed_stale,
            elapsed_ms: finished_at.saturating_sub(started_at),
        };
        info!(
            owner = %report.owner_id,
            follows = report.total_follows,
            synced = report.synced_follows,
            errors = report.errors.len(),
            entries = report.entries_stored,
            pruned = report.entries_pruned,
            evicted = report.entries_evicted,
            elapsed_ms = report.elapsed_ms,
            "Sync pass complete"
        );
        Ok(SyncOutcome::Completed(report))
    }

    fn apply_fetched(&self, cache: &mut Cache, did: &str, blocks: Vec<String>, now: Timestamp) {
        match build_entry(blocks, self.config.profile, &self.config.bloom, now) {
            EntryUpdate::Store(set) => {
                if let BlockSet::Probabilistic { bloom_filter, .. } = &set {
                    self.metrics.filters.record_built(bloom_filter);
                }
                cache.block_sets.insert(did.to_string(), set);
            }
            EntryUpdate::Remove => {
                cache.block_sets.remove(did);
            }
        }
    }

    fn evict_proactively(&self, cache: &mut Cache, pass: &mut PassState) -> Result<(), SyncError> {
        let size = cache.serialized_size()?;
        let ceiling = self.store.cache_ceiling();
        let threshold = (ceiling as f64 * self.config.proactive_eviction_ratio) as usize;
        if size <= threshold {
            return Ok(());
        }

        let report = evict_to_fit(cache, threshold)?;
        info!(
            removed = report.removed.len(),
            bytes_before = report.bytes_before,
            bytes_after = report.bytes_after,
            threshold,
            "Cache near quota, evicted before sync"
        );
        self.metrics.record_eviction(report.removed.len());
        pass.evicted += report.removed.len();
        Ok(())
    }

    /// Persist `cache`, evicting and retrying once on a quota failure.
    ///
    /// Failures are recorded in the pass errors and never abort the pass.
    fn persist(&self, cache: &mut Cache, pass: &mut PassState) {
        let err = match self.store.save_cache(cache) {
            Ok(bytes) => {
                SyncMetrics::incr(&self.metrics.persists);
                debug!(bytes, "Cache persisted");
                return;
            }
            Err(e) => e,
        };

        if !err.is_quota() {
            warn!(error = %err, "Cache persist failed");
            SyncMetrics::incr(&self.metrics.persist_failures);
            pass.errors.push(format!("persist failed: {err}"));
            return;
        }

        let ceiling = self.store.cache_ceiling();
        match evict_to_fit(cache, ceiling) {
            Ok(report) => {
                warn!(
                    removed = report.removed.len(),
                    reclaimed = report.bytes_reclaimed(),
                    ceiling,
                    "Storage quota exceeded, evicted largest entries"
                );
                self.metrics.record_eviction(report.removed.len());
                pass.evicted += report.removed.len();
            }
            Err(e) => {
                warn!(error = %e, "Eviction failed");
                SyncMetrics::incr(&self.metrics.persist_failures);
                pass.errors.push(format!("eviction failed: {e}"));
                return;
            }
        }

        match self.store.save_cache(cache) {
            Ok(bytes) => {
                SyncMetrics::incr(&self.metrics.persists);
                debug!(bytes, "Cache persisted after eviction");
            }
            Err(e) => {
                warn!(error = %e, "Cache persist failed after eviction");
                SyncMetrics::incr(&self.metrics.persist_failures);
                pass.errors.push(format!("persist failed after eviction: {e}"));
            }
        }
    }

    /// Write a progress update, which also refreshes the lease heartbeat.
    ///
    /// A failed write is recorded in the pass errors. A lease left held by a
    /// failed final write is reclaimed once its heartbeat goes stale.
    fn heartbeat(&self, update: StatusUpdate, pass: &mut PassState) {
        if let Err(e) = self.store.update_status(update) {
            warn!(error = %e, "Status update failed");
            SyncMetrics::incr(&self.metrics.status_write_failures);
            pass.errors.push(format!("status update failed: {e}"));
        }
    }

    fn release_with_error(&self, e: &SyncError) -> Result<(), SyncError> {
        let message = e.to_string();
        let now = self.store.now();
        self.store.modify_status(|status| {
            status.running = false;
            status.errors.push(message);
            status.last_heartbeat_at = now;
        })?;
        Ok(())
    }

    /// True if the stored cache should be rebuilt right away.
    ///
    /// False while nobody is logged in.
    pub fn needs_initial_sync(&self) -> Result<bool, SyncError> {
        let Some(auth) = self.store.auth()? else {
            return Ok(false);
        };
        let cache = self
            .store
            .load_cache()?
            .filter(|c| c.belongs_to(&auth.owner_id, self.config.profile));
        Ok(needs_initial_sync(cache.as_ref(), &self.config))
    }
}

#[async_trait]
impl<S, G> SyncEngineApi for SyncEngine<S, G>
where
    S: KeyValueStore + 'static,
    G: GraphApi + ?Sized + 'static,
{
    async fn run_sync(&self) -> Result<SyncOutcome, SyncError> {
        SyncEngine::run_sync(self).await
    }

    fn needs_initial_sync(&self) -> Result<bool, SyncError> {
        SyncEngine::needs_initial_sync(self)
    }

    fn status(&self) -> Result<SyncStatus, SyncError> {
        Ok(self.store.status()?)
    }

    fn phase(&self) -> SyncPhase {
        SyncEngine::phase(self)
    }

    fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }
}
