//! # Outbound Ports (Driven Ports)
//!
//! The persistence boundary the cache store writes through.
//!
//! Records are JSON text keyed by a short name. A record's size is its key
//! length plus its value length, and the backend refuses any write that
//! would push the total past its quota.

use crate::domain::errors::KVStoreError;

/// Abstract interface for durable key-value storage.
///
/// Production: `FileKVStore` (one file per record)
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> Result<Option<String>, KVStoreError>;

    /// Put a single key-value pair, replacing any previous value.
    ///
    /// Fails with `QuotaExceeded` without changing anything if the write
    /// would exceed the quota.
    fn put(&mut self, key: &str, value: &str) -> Result<(), KVStoreError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Bytes used by one record (0 if absent).
    fn size_of(&self, key: &str) -> usize;

    /// Bytes used by all records.
    fn used_bytes(&self) -> usize;

    /// Byte quota, if one is enforced.
    fn quota_bytes(&self) -> Option<usize>;
}

/// Bytes a record occupies.
pub fn record_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Quota check shared by the adapters.
pub fn check_quota(
    used: usize,
    replaced: usize,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> Result<(), KVStoreError> {
    if let Some(quota) = quota {
        let needed = used.saturating_sub(replaced) + record_size(key, value);
        if needed > quota {
            return Err(KVStoreError::QuotaExceeded { needed, quota });
        }
    }
    Ok(())
}
