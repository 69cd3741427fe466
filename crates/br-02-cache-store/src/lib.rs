//! # BR-02 Cache Store
//!
//! Durable persistence of the follow-set block index.
//!
//! ## Records
//!
//! | Key | Aggregate | Writer |
//! |-----|-----------|--------|
//! | `block_cache` | [`Cache`] (follow list + per-user [`BlockSet`]s) | sync engine only |
//! | `sync_status` | [`SyncStatus`] (progress + lease heartbeat) | sync engine, runtime |
//! | `auth_token` | [`shared_types::AuthToken`] | runtime |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Aggregates, quota eviction, errors, configuration
//! - `ports/` - `KeyValueStore` persistence boundary
//! - `adapters/` - In-memory and file-backed stores
//! - `service/` - `CacheStore`, atomic record access
//!
//! ## Quota
//!
//! Writes are refused with [`StoreError::QuotaExceeded`] once the cache
//! record would not fit under the soft quota next to the other records.
//! Callers answer with [`evict_to_fit`] and one retry.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileKVStore, InMemoryKVStore};
pub use domain::{
    entry_size, evict_to_fit, keys, BlockSet, Cache, CacheStats, EvictionReport, KVStoreError,
    StatusUpdate, StorageConfig, StoreError, SyncStatus, MIB,
};
pub use ports::KeyValueStore;
pub use service::CacheStore;
