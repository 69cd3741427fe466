use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{check_quota, record_size, KeyValueStore};
use std::collections::HashMap;

/// In-memory key-value store for unit tests.
///
/// Optionally enforces a byte quota, and can be switched into a failing
/// mode to exercise backend errors.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: HashMap<String, String>,
    quota: Option<usize>,
    fail_writes: bool,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses writes past `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Make every subsequent `put` and `delete` fail with an I/O error.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    fn check_writable(&self) -> Result<(), KVStoreError> {
        if self.fail_writes {
            return Err(KVStoreError::IOError {
                message: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &str) -> Result<Option<String>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), KVStoreError> {
        self.check_writable()?;
        check_quota(self.used_bytes(), self.size_of(key), key, value, self.quota)?;
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), KVStoreError> {
        self.check_writable()?;
        self.data.remove(key);
        Ok(())
    }

    fn size_of(&self, key: &str) -> usize {
        self.data.get(key).map(|v| record_size(key, v)).unwrap_or(0)
    }

    fn used_bytes(&self) -> usize {
        self.data.iter().map(|(k, v)| record_size(k, v)).sum()
    }

    fn quota_bytes(&self) -> Option<usize> {
        self.quota
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = InMemoryKVStore::new();

        store.put("key1", "value1").unwrap();
        store.put("key2", "value2").unwrap();

        assert_eq!(store.get("key1").unwrap(), Some("value1".to_string()));
        assert_eq!(store.get("key3").unwrap(), None);

        assert!(store.exists("key1").unwrap());
        assert!(!store.exists("key3").unwrap());
        assert_eq!(store.used_bytes(), 20);

        store.delete("key1").unwrap();
        store.delete("key1").unwrap();
        assert_eq!(store.size_of("key1"), 0);
    }

    #[test]
    fn test_quota_rejects_and_leaves_state() {
        let mut store = InMemoryKVStore::with_quota(10);
        store.put("k", "12345").unwrap();

        let err = store.put("j", "123456").unwrap_err();
        assert_eq!(
            err,
            KVStoreError::QuotaExceeded {
                needed: 13,
                quota: 10
            }
        );
        assert_eq!(store.get("j").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_replacement_not_addition() {
        let mut store = InMemoryKVStore::with_quota(10);
        store.put("k", "123456789").unwrap();
        // Replacing the record frees its old bytes first.
        store.put("k", "987654321").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_injected_failure() {
        let mut store = InMemoryKVStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.put("k", "v"),
            Err(KVStoreError::IOError { .. })
        ));
        store.set_fail_writes(false);
        assert!(store.put("k", "v").is_ok());
    }
}
