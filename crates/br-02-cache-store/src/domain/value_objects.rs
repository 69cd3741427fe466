//! # Value Objects
//!
//! Storage configuration and the names of the persisted records.

use serde::{Deserialize, Serialize};

/// 1 MiB.
pub const MIB: usize = 1024 * 1024;

/// Names of the durable records.
pub mod keys {
    /// The root `Cache` aggregate.
    pub const CACHE: &str = "block_cache";
    /// The `SyncStatus` record.
    pub const SYNC_STATUS: &str = "sync_status";
    /// The `AuthToken` record.
    pub const AUTH_TOKEN: &str = "auth_token";
}

/// Byte budget for persisted data.
///
/// `quota_bytes` is the soft ceiling the cache is pruned to.
/// `hard_limit_bytes` is the platform limit at which the backend refuses writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub quota_bytes: usize,
    pub hard_limit_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            quota_bytes: 8 * MIB,
            hard_limit_bytes: 10 * MIB,
        }
    }
}

impl StorageConfig {
    /// Small budget for tests.
    pub fn for_testing() -> Self {
        Self {
            quota_bytes: 64 * 1024,
            hard_limit_bytes: 80 * 1024,
        }
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn with_hard_limit(mut self, hard_limit_bytes: usize) -> Self {
        self.hard_limit_bytes = hard_limit_bytes;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.quota_bytes == 0 {
            return Err("quota_bytes must be greater than 0".to_string());
        }
        if self.quota_bytes > self.hard_limit_bytes {
            return Err(format!(
                "quota_bytes ({}) cannot exceed hard_limit_bytes ({})",
                self.quota_bytes, self.hard_limit_bytes
            ));
        }
        Ok(())
    }
}
