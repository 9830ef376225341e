use http::StatusCode;
use price_proxy_core::ProxyError;

/// Status code a lookup error is reported with
pub fn status_for(err: &ProxyError) -> StatusCode {
    match err {
        ProxyError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        ProxyError::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
        ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ProxyError::CacheUnavailable(_)
        | ProxyError::BusUnavailable(_)
        | ProxyError::QueueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProxyError::Serialization(_)
        | ProxyError::Deserialization(_)
        | ProxyError::InvalidRecord(_)
        | ProxyError::MissingAfterNotify(_)
        | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Stable machine-readable error code
pub fn error_code(err: &ProxyError) -> &'static str {
    match err {
        ProxyError::CacheUnavailable(_) => "cache_unavailable",
        ProxyError::FetchFailed { .. } => "fetch_failed",
        ProxyError::BusUnavailable(_) => "bus_unavailable",
        ProxyError::QueueUnavailable(_) => "queue_unavailable",
        ProxyError::Serialization(_) => "serialization",
        ProxyError::Deserialization(_) => "deserialization",
        ProxyError::InvalidKey(_) => "invalid_key",
        ProxyError::InvalidRecord(_) => "invalid_record",
        ProxyError::MissingAfterNotify(_) => "missing_after_notify",
        ProxyError::Timeout => "timeout",
        ProxyError::Internal(_) => "internal",
    }
}
