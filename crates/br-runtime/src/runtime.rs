//! # Runtime Wiring
//!
//! Builds the store, the engines and the scheduler from one
//! [`RuntimeConfig`] and owns the scheduler task.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Open the key-value store (file-backed or in-memory)
//! 3. Build the sync and query engines over one shared `CacheStore`
//! 4. Spawn the scheduler (startup check, interval, triggers)

use std::sync::Arc;

use br_02_cache_store::{CacheStore, FileKVStore, InMemoryKVStore, KeyValueStore, StoreError};
use br_03_sync_engine::SyncEngine;
use br_04_query_engine::QueryEngine;
use shared_types::{GraphApi, SystemTimeSource, TimeSource};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::handler::BlockRadarService;
use crate::scheduler::Scheduler;

/// A running BlockRadar instance.
pub struct BlockRadarRuntime<S, G>
where
    S: KeyValueStore + 'static,
    G: GraphApi + ?Sized + 'static,
{
    service: Arc<BlockRadarService<S, G>>,
    shutdown_tx: watch::Sender<bool>,
    scheduler: JoinHandle<()>,
}

impl<G> BlockRadarRuntime<FileKVStore, G>
where
    G: GraphApi + ?Sized + 'static,
{
    /// Start over the file-backed store in the configured data directory.
    pub fn open(config: &RuntimeConfig, graph: Arc<G>) -> Result<Self, RuntimeError> {
        let dir = config.data_dir();
        let kv = FileKVStore::open(&dir, Some(config.storage.hard_limit_bytes))
            .map_err(StoreError::from)?;
        info!(dir = %dir.display(), "Using file-backed store");
        Self::start(kv, graph, config, Arc::new(SystemTimeSource))
    }
}

impl<G> BlockRadarRuntime<InMemoryKVStore, G>
where
    G: GraphApi + ?Sized + 'static,
{
    /// Start over a store that lives only as long as the process.
    pub fn in_memory(config: &RuntimeConfig, graph: Arc<G>) -> Result<Self, RuntimeError> {
        let kv = InMemoryKVStore::with_quota(config.storage.hard_limit_bytes);
        Self::start(kv, graph, config, Arc::new(SystemTimeSource))
    }
}

impl<S, G> BlockRadarRuntime<S, G>
where
    S: KeyValueStore + 'static,
    G: GraphApi + ?Sized + 'static,
{
    /// Wire every subsystem over `kv` and spawn the scheduler.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        kv: S,
        graph: Arc<G>,
        config: &RuntimeConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let store = Arc::new(CacheStore::new(kv, config.storage.clone(), clock));
        let sync = Arc::new(SyncEngine::new(
            Arc::clone(&store),
            Arc::clone(&graph),
            config.sync.clone(),
        )?);
        let query = QueryEngine::new(Arc::clone(&store), Arc::clone(&graph), config.query.clone())?;

        let (scheduler, trigger) = Scheduler::new(sync.clone(), config.scheduler.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = tokio::spawn(scheduler.run(shutdown_rx));

        info!(
            profile = %config.sync.profile,
            quota_bytes = config.storage.quota_bytes,
            interval_secs = config.scheduler.sync_interval_secs,
            "BlockRadar runtime started"
        );

        Ok(Self {
            service: Arc::new(BlockRadarService::new(store, graph, sync, query, trigger)),
            shutdown_tx,
            scheduler,
        })
    }

    /// The request surface.
    pub fn service(&self) -> Arc<BlockRadarService<S, G>> {
        Arc::clone(&self.service)
    }

    /// Stop the scheduler, letting a pass in progress finish.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            error!("Scheduler already gone");
        }
        if let Err(e) = self.scheduler.await {
            error!(error = %e, "Scheduler task failed");
        }
        info!("Shutdown complete");
    }
}
