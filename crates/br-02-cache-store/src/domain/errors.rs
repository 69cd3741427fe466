//! # Domain Errors
//!
//! Error types for the Cache Store subsystem.
//!
//! `QuotaExceeded` is distinguished from every other failure: it is the
//! signal the sync engine answers with eviction and a single retry.

use thiserror::Error;

/// Errors surfaced by [`crate::CacheStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A write would push persisted bytes past the quota.
    #[error("Storage quota exceeded: write needs {needed} bytes, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    /// The backing store failed.
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    /// A persisted record could not be decoded.
    #[error("Corrupted record '{key}': {message}")]
    Corrupted { key: String, message: String },

    /// A record could not be encoded.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl StoreError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: e.to_string(),
        }
    }
}

/// Errors from the key-value backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    #[error("Quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Invalid key: {key}")]
    InvalidKey { key: String },

    #[error("I/O error: {message}")]
    IOError { message: String },
}

impl From<std::io::Error> for KVStoreError {
    fn from(e: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: e.to_string(),
        }
    }
}

impl From<KVStoreError> for StoreError {
    fn from(e: KVStoreError) -> Self {
        match e {
            KVStoreError::QuotaExceeded { needed, quota } => {
                StoreError::QuotaExceeded { needed, quota }
            }
            other => StoreError::Backend {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_quota_maps_to_store_quota() {
        let err: StoreError = KVStoreError::QuotaExceeded {
            needed: 11,
            quota: 10,
        }
        .into();
        assert!(err.is_quota());
        assert_eq!(
            err,
            StoreError::QuotaExceeded {
                needed: 11,
                quota: 10
            }
        );
    }

    #[test]
    fn test_io_maps_to_backend() {
        let err: StoreError = KVStoreError::IOError {
            message: "disk gone".into(),
        }
        .into();
        assert!(!err.is_quota());
        assert!(err.to_string().contains("disk gone"));
    }
}
