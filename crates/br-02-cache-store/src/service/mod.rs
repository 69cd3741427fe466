//! # Cache Store Service
//!
//! Atomic get/set over the three root records (Cache, SyncStatus, AuthToken).
//!
//! Every mutation is a read-modify-write of a whole record performed while
//! holding the store lock, so two callers never interleave inside one
//! record. `update_status` stamps `last_heartbeat_at` as a side effect,
//! which is what keeps the sync lease alive.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{AuthToken, StorageProfile, SystemTimeSource, TimeSource, Timestamp};
use tracing::{debug, info, warn};

use crate::adapters::InMemoryKVStore;
use crate::domain::{
    keys, Cache, CacheStats, StatusUpdate, StorageConfig, StoreError, SyncStatus,
};
use crate::ports::KeyValueStore;


/// Durable store for the cache, sync status and auth token.
pub struct CacheStore<S: KeyValueStore> {
    kv: Mutex<S>,
    config: StorageConfig,
    clock: Arc<dyn TimeSource>,
}

impl CacheStore<InMemoryKVStore> {
    /// In-memory store enforcing the configured hard limit.
    pub fn in_memory(config: StorageConfig) -> Self {
        let kv = InMemoryKVStore::with_quota(config.hard_limit_bytes);
        Self::new(kv, config, Arc::new(SystemTimeSource))
    }
}

impl<S: KeyValueStore> CacheStore<S> {
    pub fn new(kv: S, config: StorageConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            kv: Mutex::new(kv),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now_millis()
    }

    /// Run `f` against the backend while holding the store lock.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.kv.lock())
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Load the persisted cache, whoever it belongs to.
    ///
    /// An undecodable record is treated as absent; the cache is always
    /// rebuildable from the remote graph.
    pub fn load_cache(&self) -> Result<Option<Cache>, StoreError> {
        let kv = self.kv.lock();
        match read_json::<Cache, _>(&*kv, keys::CACHE) {
            Err(StoreError::Corrupted { key, message }) => {
                warn!(key = %key, error = %message, "Discarding undecodable cache");
                Ok(None)
            }
            other => other,
        }
    }

    /// Load the cache for `owner_id` under `profile`.
    ///
    /// A cache pinned to another identity or profile is discarded and an
    /// empty one is returned in its place.
    pub fn load_cache_for(
        &self,
        owner_id: &str,
        profile: StorageProfile,
    ) -> Result<Cache, StoreError> {
        match self.load_cache()? {
            Some(cache) if cache.belongs_to(owner_id, profile) => Ok(cache),
            Some(cache) => {
                info!(
                    previous_owner = %cache.owner_id,
                    previous_profile = %cache.profile,
                    owner = %owner_id,
                    profile = %profile,
                    "Cache belongs to another identity or profile, starting empty"
                );
                Ok(Cache::empty(owner_id, profile))
            }
            None => Ok(Cache::empty(owner_id, profile)),
        }
    }

    /// Persist the cache. Returns the bytes written.
    ///
    /// Fails with `QuotaExceeded` when the record would not fit under
    /// [`Self::cache_ceiling`] or when the backend refuses it.
    pub fn save_cache(&self, cache: &Cache) -> Result<usize, StoreError> {
        let json = serde_json::to_string(cache)?;
        let mut kv = self.kv.lock();

        let ceiling = ceiling_for(&*kv, &self.config);
        if json.len() > ceiling {
            let others = kv.used_bytes().saturating_sub(kv.size_of(keys::CACHE));
            return Err(StoreError::QuotaExceeded {
                needed: others + keys::CACHE.len() + json.len(),
                quota: self.config.quota_bytes,
            });
        }

        kv.put(keys::CACHE, &json)?;
        debug!(bytes = json.len(), entries = cache.block_sets.len(), "Cache persisted");
        Ok(json.len())
    }

    pub fn clear_cache(&self) -> Result<(), StoreError> {
        self.kv.lock().delete(keys::CACHE)?;
        Ok(())
    }

    /// Largest cache record that fits the soft quota next to the other records.
    pub fn cache_ceiling(&self) -> usize {
        ceiling_for(&*self.kv.lock(), &self.config)
    }

    pub fn stats(&self) -> Result<CacheStats, StoreError> {
        let quota_bytes = self.config.quota_bytes;
        Ok(match self.load_cache()? {
            Some(cache) => {
                let bytes = cache.serialized_size()?;
                CacheStats::from_cache(&cache, bytes, quota_bytes)
            }
            None => CacheStats {
                quota_bytes,
                ..Default::default()
            },
        })
    }

    // =========================================================================
    // Sync status
    // =========================================================================

    /// Current status; a missing or undecodable record reads as idle.
    pub fn status(&self) -> Result<SyncStatus, StoreError> {
        let kv = self.kv.lock();
        Ok(read_status(&*kv))
    }

    /// Apply a partial update and stamp the heartbeat.
    pub fn update_status(&self, update: StatusUpdate) -> Result<SyncStatus, StoreError> {
        let now = self.now();
        self.modify_status(|status| {
            update.apply(status, now);
            status.clone()
        })
    }

    /// Atomic read-modify-write of the status record.
    ///
    /// The record is written back only if `f` returns normally; the closure's
    /// result is passed through.
    pub fn modify_status<R>(&self, f: impl FnOnce(&mut SyncStatus) -> R) -> Result<R, StoreError> {
        let mut kv = self.kv.lock();
        let mut status = read_status(&*kv);
        let result = f(&mut status);
        write_json(&mut *kv, keys::SYNC_STATUS, &status)?;
        Ok(result)
    }

    pub fn reset_status(&self) -> Result<(), StoreError> {
        self.kv.lock().delete(keys::SYNC_STATUS)?;
        Ok(())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    pub fn auth(&self) -> Result<Option<AuthToken>, StoreError> {
        let kv = self.kv.lock();
        match read_json::<AuthToken, _>(&*kv, keys::AUTH_TOKEN) {
            Err(StoreError::Corrupted { message, .. }) => {
                warn!(error = %message, "Ignoring undecodable auth token");
                Ok(None)
            }
            other => other,
        }
    }

    pub fn set_auth(&self, token: &AuthToken) -> Result<(), StoreError> {
        write_json(&mut *self.kv.lock(), keys::AUTH_TOKEN, token)
    }

    pub fn clear_auth(&self) -> Result<(), StoreError> {
        self.kv.lock().delete(keys::AUTH_TOKEN)?;
        Ok(())
    }
}

fn ceiling_for<S: KeyValueStore + ?Sized>(kv: &S, config: &StorageConfig) -> usize {
    let others = kv.used_bytes().saturating_sub(kv.size_of(keys::CACHE));
    config
        .quota_bytes
        .saturating_sub(others)
        .saturating_sub(keys::CACHE.len())
}

fn read_json<T: DeserializeOwned, K: KeyValueStore + ?Sized>(
    kv: &K,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = kv.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupted {
            key: key.to_string(),
            message: e.to_string(),
        })
}

fn write_json<T: Serialize + ?Sized, K: KeyValueStore + ?Sized>(
    kv: &mut K,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    kv.put(key, &json)?;
    Ok(())
}

fn read_status<K: KeyValueStore + ?Sized>(kv: &K) -> SyncStatus {
    match read_json::<SyncStatus, _>(kv, keys::SYNC_STATUS) {
        Ok(status) => status.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Unreadable sync status, treating as idle");
            SyncStatus::default()
        }
    }
}
