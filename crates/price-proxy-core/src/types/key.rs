//! Product key type

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProxyError, Result};

/// Maximum accepted key length in bytes
pub const MAX_KEY_LEN: usize = 256;

/// Identifier of a priced item
///
/// The same key is used as the cache key, the dispatch queue job key and
/// the notification topic, so it is validated once on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductKey(String);

impl ProductKey {
    /// Create a validated key
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(ProxyError::InvalidKey("key is empty".to_string()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(ProxyError::InvalidKey(format!(
                "key is {} bytes, limit is {}",
                key.len(),
                MAX_KEY_LEN
            )));
        }
        if key.chars().any(|c| c.is_control()) {
            return Err(ProxyError::InvalidKey(
                "key contains control characters".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductKey {
    type Error = ProxyError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ProductKey {
    type Error = ProxyError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProductKey> for String {
    fn from(key: ProductKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key() {
        let key = ProductKey::new("product-1").unwrap();
        assert_eq!(key.as_str(), "product-1");
        assert_eq!(key.to_string(), "product-1");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            ProductKey::new(""),
            Err(ProxyError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_long_key_rejected() {
        let key = "k".repeat(MAX_KEY_LEN + 1);
        assert!(ProductKey::new(key).is_err());
        assert!(ProductKey::new("k".repeat(MAX_KEY_LEN)).is_ok());
    }

    #[test]
    fn test_control_chars_rejected() {
        assert!(ProductKey::new("p1\n").is_err());
        assert!(ProductKey::new("p\u{0}1").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let key: ProductKey = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(key.as_str(), "p1");

        let err = serde_json::from_str::<ProductKey>("\"\"");
        assert!(err.is_err());
    }
}
