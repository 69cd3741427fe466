//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Failure of a remote graph call.
///
/// The graph client retries transient failures (rate limits, timeouts)
/// internally; by the time one of these reaches the core, retries are exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Identity could not be resolved to a service endpoint.
    #[error("Could not resolve service endpoint for {did}")]
    UnresolvedIdentity { did: String },

    /// Rate limit still in effect after the client's retry budget.
    #[error("Rate limited after retries exhausted")]
    RateLimited,

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Remote returned a non-success status.
    #[error("Remote error {status}: {message}")]
    Remote { status: u16, message: String },

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Unknown storage profile name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown storage profile: {0} (expected `exact` or `probabilistic`)")]
pub struct ProfileParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = GraphError::Remote {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_profile_parse_error_display() {
        let err = ProfileParseError("fuzzy".to_string());
        assert!(err.to_string().contains("fuzzy"));
    }
}
