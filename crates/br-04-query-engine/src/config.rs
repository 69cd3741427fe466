//! # Query Engine Configuration

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Query engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Block lists longer than this are binary searched (stored lists) or
    /// hashed (the viewed account's own list) instead of scanned.
    pub hash_set_threshold: usize,

    /// Concurrent live fetches when verifying filter candidates.
    pub verify_concurrency: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            hash_set_threshold: 32,
            verify_concurrency: 5,
        }
    }
}

impl QueryConfig {
    /// Create a config for testing (tiny threshold so both paths run).
    pub fn for_testing() -> Self {
        Self {
            hash_set_threshold: 2,
            verify_concurrency: 2,
        }
    }

    pub fn with_hash_set_threshold(mut self, threshold: usize) -> Self {
        self.hash_set_threshold = threshold;
        self
    }

    pub fn with_verify_concurrency(mut self, concurrency: usize) -> Self {
        self.verify_concurrency = concurrency;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.verify_concurrency == 0 {
            return Err(QueryError::InvalidConfig(
                "verify_concurrency must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
