use price_proxy_core::{PriceRecord, ProxyError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::error_code;

/// Successful lookup body: `{"price": 42}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBody {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&PriceRecord> for PriceBody {
    fn from(record: &PriceRecord) -> Self {
        Self {
            price: record.price,
        }
    }
}

/// Error body: `{"error": "fetch_failed", "message": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::new("not_found", format!("no route for {}", path))
    }
}

impl From<&ProxyError> for ErrorBody {
    fn from(err: &ProxyError) -> Self {
        Self::new(error_code(err), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_body_is_numeric() {
        let record = PriceRecord::new(Decimal::from(42), "abc").unwrap();
        let json = serde_json::to_value(PriceBody::from(&record)).unwrap();
        assert_eq!(json, serde_json::json!({ "price": 42.0 }));
    }

    #[test]
    fn test_error_body_from_error() {
        let body = ErrorBody::from(&ProxyError::Timeout);
        assert_eq!(body.error, "timeout");
        assert!(!body.message.is_empty());
    }

    #[test]
    fn test_not_found_body() {
        let body = ErrorBody::not_found("/v2/nothing");
        assert_eq!(body.error, "not_found");
        assert!(body.message.contains("/v2/nothing"));
    }
}
