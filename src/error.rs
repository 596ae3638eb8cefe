//! Error types for cache operations
//!
//! This module defines the error type shared by both cache tiers. Only
//! `InvalidTtl`, `Config` and `Scheduler` errors ever reach business-logic
//! callers; transport and serialization failures are absorbed inside the
//! remote tier, which degrades to a miss instead of failing the request.

use std::time::Duration;
use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Non-positive TTL passed to a write operation - a caller programming error
    #[error("invalid TTL: {ttl:?} (must be greater than zero)")]
    InvalidTtl { ttl: Duration },

    /// Connection error - network or connection pool issues on the remote tier
    #[error("connection error: {0}")]
    Connection(String),

    /// Remote operation exceeded its bounded timeout
    #[error("operation timed out after {timeout_ms}ms: {context}")]
    Timeout { timeout_ms: u64, context: String },

    /// Payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Maintenance scheduler misuse or join failure
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Generic error with context
    #[error("error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::Connection("refused".to_string());
        assert_eq!(error.to_string(), "connection error: refused");

        let timeout_error = CacheError::Timeout {
            timeout_ms: 250,
            context: "GET".to_string(),
        };
        assert!(timeout_error.to_string().contains("timed out after 250ms"));

        let ttl_error = CacheError::InvalidTtl {
            ttl: Duration::from_secs(0),
        };
        assert!(ttl_error.to_string().contains("invalid TTL"));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));
    }
}
