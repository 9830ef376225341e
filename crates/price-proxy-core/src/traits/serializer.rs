//! Pluggable encoding of cached records

use crate::ProxyError;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for pluggable serialization formats
///
/// Built-in implementations: JSON (default) and MessagePack.
pub trait Serializer: Send + Sync + Clone + 'static {
    /// Name of the serializer (for debugging/metrics)
    fn name(&self) -> &str;

    /// Serialize a value to bytes
    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProxyError>;

    /// Deserialize bytes to a value
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProxyError>;
}

/// JSON serializer (default)
///
/// Human-readable, and what other clients of a shared Redis expect to find.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProxyError> {
        serde_json::to_vec(value).map_err(|e| ProxyError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProxyError> {
        serde_json::from_slice(bytes).map_err(|e| ProxyError::Deserialization(e.to_string()))
    }
}

/// MessagePack serializer (optional)
///
/// More compact than JSON, but not human-readable.
/// Enable with `msgpack` feature.
#[cfg(feature = "msgpack")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackSerializer;

#[cfg(feature = "msgpack")]
impl Serializer for MsgPackSerializer {
    fn name(&self) -> &str {
        "msgpack"
    }

    fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProxyError> {
        rmp_serde::to_vec_named(value).map_err(|e| ProxyError::Serialization(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProxyError> {
        rmp_serde::from_slice(bytes).map_err(|e| ProxyError::Deserialization(e.to_string()))
    }
}
