//! Error types for the Bloom filter subsystem

use thiserror::Error;

/// Errors that can occur while building or decoding a Bloom filter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid bit array encoding: {0}")]
    Encoding(String),

    #[error("Bit array length mismatch: expected {expected_bytes} bytes, got {actual_bytes}")]
    SizeMismatch {
        expected_bytes: usize,
        actual_bytes: usize,
    },
}
