//! # Domain Errors
//!
//! Error types for the Sync Engine.
//!
//! Lock contention and a missing identity are not errors; they surface as
//! [`super::SkipReason`]. Per-user fetch failures and a failed persist after
//! eviction are recorded in the status and do not abort a pass.

use br_02_cache_store::StoreError;
use shared_types::GraphError;
use thiserror::Error;

/// Sync engine error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Paging through the follow listing failed; the pass was aborted.
    #[error("Follow enumeration failed: {0}")]
    Enumeration(GraphError),

    /// The cache store failed outside the quota/eviction path.
    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration rejected by validation.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_error_message() {
        let err = SyncError::Enumeration(GraphError::Timeout);
        assert!(err.to_string().contains("enumeration"));
    }

    #[test]
    fn test_store_error_converts() {
        let err: SyncError = StoreError::Backend {
            message: "gone".into(),
        }
        .into();
        assert!(matches!(err, SyncError::Store(_)));
    }
}
