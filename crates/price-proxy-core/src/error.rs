//! Error types for proxy operations

use thiserror::Error;

/// Main error type for all proxy operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    /// Cache store get/set failed
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Upstream fetch failed, timed out, or the worker faulted
    #[error("fetch failed for key {key}: {reason}")]
    FetchFailed { key: String, reason: String },

    /// Notification bus subscribe/publish failed
    #[error("notification bus unavailable: {0}")]
    BusUnavailable(String),

    /// Dispatch queue operation failed
    #[error("dispatch queue unavailable: {0}")]
    QueueUnavailable(String),

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Product key rejected on construction
    #[error("invalid product key: {0}")]
    InvalidKey(String),

    /// Price record rejected on construction
    #[error("invalid price record: {0}")]
    InvalidRecord(String),

    /// A ready notification arrived but the cache has no entry for the key
    #[error("notification for key {0} arrived but the cache entry is absent")]
    MissingAfterNotify(String),

    /// Waiting for a fetch exceeded the configured limit
    #[error("operation timed out")]
    Timeout,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Build a `FetchFailed` error for the given key
    pub fn fetch_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ProxyError::FetchFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the same operation and expect progress
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProxyError::CacheUnavailable(_)
                | ProxyError::FetchFailed { .. }
                | ProxyError::BusUnavailable(_)
                | ProxyError::QueueUnavailable(_)
                | ProxyError::Timeout
        )
    }
}

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProxyError::CacheUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "cache unavailable: connection refused");

        let err = ProxyError::fetch_failed("p1", "upstream 500");
        assert_eq!(err.to_string(), "fetch failed for key p1: upstream 500");

        let err = ProxyError::MissingAfterNotify("p2".to_string());
        assert_eq!(
            err.to_string(),
            "notification for key p2 arrived but the cache entry is absent"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ProxyError::Timeout.is_retryable());
        assert!(ProxyError::fetch_failed("p1", "boom").is_retryable());
        assert!(ProxyError::BusUnavailable("down".into()).is_retryable());
        assert!(!ProxyError::InvalidKey("".into()).is_retryable());
        assert!(!ProxyError::MissingAfterNotify("p1".into()).is_retryable());
    }

    #[test]
    fn test_error_clone() {
        let err = ProxyError::Timeout;
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
