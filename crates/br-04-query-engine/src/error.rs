//! Query engine errors.
//!
//! A missing cache or identity is not an error; lookups answer empty.
//! Candidates whose verification fetch fails are dropped, not reported.

use br_02_cache_store::StoreError;
use thiserror::Error;

/// Errors from blocking-info lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The cache store could not be read.
    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration rejected by validation.
    #[error("Invalid query configuration: {0}")]
    InvalidConfig(String),
}
