//! # Integration Harness
//!
//! One store, one graph and one clock shared by a sync engine and a query
//! engine, the way the runtime wires them.

use std::sync::Arc;

use anyhow::Result;
use br_02_cache_store::{CacheStore, InMemoryKVStore, KeyValueStore, StorageConfig};
use br_03_sync_engine::{SyncConfig, SyncEngine, SyncOutcome, SyncReport};
use br_04_query_engine::{BlockingInfo, QueryConfig, QueryEngine};
use shared_types::{fetch_block_list, AuthToken, Did, FollowedUser, InMemoryGraph, ManualClock};

/// Clock start used by every harness: 2024-01-01T00:00:00Z.
pub const T0: u64 = 1_704_067_200_000;

/// The logged-in account.
pub const OWNER: &str = "did:plc:owner";

/// Subsystems wired over one store.
pub struct Harness<S: KeyValueStore + 'static = InMemoryKVStore> {
    pub store: Arc<CacheStore<S>>,
    pub graph: Arc<InMemoryGraph>,
    pub clock: Arc<ManualClock>,
    pub sync: SyncEngine<S, InMemoryGraph>,
    pub query: QueryEngine<S, InMemoryGraph>,
}

impl Harness<InMemoryKVStore> {
    /// In-memory store with the testing quota and default sync tuning.
    pub fn new() -> Result<Self> {
        Self::with_configs(StorageConfig::for_testing(), SyncConfig::for_testing())
    }

    pub fn with_configs(storage: StorageConfig, sync: SyncConfig) -> Result<Self> {
        let kv = InMemoryKVStore::with_quota(storage.hard_limit_bytes);
        Self::over(kv, storage, sync, Arc::new(InMemoryGraph::new()))
    }
}

impl<S: KeyValueStore + 'static> Harness<S> {
    /// Wire every subsystem over `kv`.
    pub fn over(
        kv: S,
        storage: StorageConfig,
        sync: SyncConfig,
        graph: Arc<InMemoryGraph>,
    ) -> Result<Self> {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(CacheStore::new(kv, storage, clock.clone()));
        let sync = SyncEngine::new(store.clone(), graph.clone(), sync)?;
        let query = QueryEngine::new(store.clone(), graph.clone(), QueryConfig::default())?;
        Ok(Self {
            store,
            graph,
            clock,
            sync,
            query,
        })
    }

    pub fn login(&self) -> Result<()> {
        self.store.set_auth(&AuthToken::new(
            "access-token",
            OWNER,
            "owner.test",
            "https://pds.test",
        ))?;
        Ok(())
    }

    /// Follow `n` users `did:plc:uNN`; `blocks(i)` lists what user `i` blocks.
    pub fn follow<F>(&self, n: usize, blocks: F) -> Vec<FollowedUser>
    where
        F: Fn(usize) -> Vec<String>,
    {
        let users: Vec<FollowedUser> = (0..n)
            .map(|i| FollowedUser::new(format!("did:plc:u{i:02}"), format!("u{i:02}.test")))
            .collect();
        for (i, user) in users.iter().enumerate() {
            self.graph.set_blocks(&user.did, blocks(i));
        }
        self.graph.set_follows(OWNER, users.clone());
        users
    }

    /// Run a pass and insist it completed.
    pub async fn sync_completed(&self) -> Result<SyncReport> {
        match self.sync.run_sync().await? {
            SyncOutcome::Completed(report) => Ok(report),
            SyncOutcome::Skipped(reason) => anyhow::bail!("pass skipped: {reason:?}"),
        }
    }

    /// Look up `profile_id`, fetching its own block list the way the request
    /// handler does.
    pub async fn lookup(&self, profile_id: &str) -> Result<BlockingInfo> {
        let profile_blocks: Vec<Did> = fetch_block_list(self.graph.as_ref(), profile_id)
            .await
            .unwrap_or_default();
        Ok(self
            .query
            .lookup_blocking_info(profile_id, &profile_blocks)
            .await?)
    }
}

/// DIDs of `users`, in order.
pub fn dids(users: &[FollowedUser]) -> Vec<&str> {
    users.iter().map(|u| u.did.as_str()).collect()
}
