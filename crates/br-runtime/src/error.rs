//! Runtime errors and the numeric codes they map to in a response envelope.

use br_02_cache_store::StoreError;
use br_03_sync_engine::SyncError;
use br_04_query_engine::QueryError;
use thiserror::Error;

use crate::config::ConfigError;

/// Numeric error codes carried by [`crate::Response::Error`].
///
/// Follows the JSON-RPC 2.0 layout: protocol errors in the -32700..-32600
/// range, application errors in -32000..-32099.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub const STORAGE_ERROR: i32 = -32001;
    pub const SYNC_FAILED: i32 = -32002;
    pub const INVALID_CONFIG: i32 = -32003;
    pub const QUOTA_EXCEEDED: i32 = -32005;
}

/// Runtime error types.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Query(#[from] QueryError),

    /// The request could not be decoded or is missing a field.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Installing the tracing subscriber failed.
    #[error("Tracing setup failed: {0}")]
    Tracing(String),
}

impl RuntimeError {
    /// Code reported to the caller.
    pub fn code(&self) -> i32 {
        match self {
            RuntimeError::Config(_) => codes::INVALID_CONFIG,
            RuntimeError::Store(e)
            | RuntimeError::Sync(SyncError::Store(e))
            | RuntimeError::Query(QueryError::Store(e)) => {
                if e.is_quota() {
                    codes::QUOTA_EXCEEDED
                } else {
                    codes::STORAGE_ERROR
                }
            }
            RuntimeError::Sync(SyncError::InvalidConfig(_))
            | RuntimeError::Query(QueryError::InvalidConfig(_)) => codes::INVALID_CONFIG,
            RuntimeError::Sync(_) => codes::SYNC_FAILED,
            RuntimeError::InvalidRequest(_) => codes::INVALID_REQUEST,
            RuntimeError::Tracing(_) => codes::INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::GraphError;

    #[test]
    fn test_error_codes() {
        let quota: RuntimeError = StoreError::QuotaExceeded {
            needed: 10,
            quota: 5,
        }
        .into();
        assert_eq!(quota.code(), codes::QUOTA_EXCEEDED);

        let nested: RuntimeError = SyncError::Store(StoreError::Backend {
            message: "disk".into(),
        })
        .into();
        assert_eq!(nested.code(), codes::STORAGE_ERROR);

        let enumeration: RuntimeError = SyncError::Enumeration(GraphError::Timeout).into();
        assert_eq!(enumeration.code(), codes::SYNC_FAILED);

        assert_eq!(
            RuntimeError::InvalidRequest("x".into()).code(),
            codes::INVALID_REQUEST
        );
    }
}
