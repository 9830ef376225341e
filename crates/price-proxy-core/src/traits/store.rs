//! Cache store trait

use crate::{CacheStats, Result};
use async_trait::async_trait;

/// Key/value store holding serialized price records
///
/// Implementations must offer linearizable get/set per key; the coordinator
/// relies on a write being visible to every read that starts after it.
/// Failures map to `ProxyError::CacheUnavailable`.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Get the raw value for a key
    ///
    /// Returns `None` if the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a raw value for a key, replacing any previous value
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Delete a key
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remove every entry owned by this store
    async fn clear(&self) -> Result<()>;

    /// Get store statistics
    async fn stats(&self) -> Result<CacheStats>;

    /// Get the number of entries
    async fn len(&self) -> Result<usize>;

    /// Check if the store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
