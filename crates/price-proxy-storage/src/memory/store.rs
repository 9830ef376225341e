//! In-memory cache store using DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use price_proxy_core::{CacheStats, CacheStore, Result};

/// Internal statistics tracking
#[derive(Debug, Default)]
struct MemoryStats {
    hits: u64,
    misses: u64,
    writes: u64,
    deletes: u64,
}

/// In-memory cache store
///
/// Entries are kept until deleted; there is no eviction.
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Main data store
    data: Arc<DashMap<String, Vec<u8>>>,
    /// Statistics
    stats: Arc<RwLock<MemoryStats>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.data.get(key).map(|entry| entry.value().clone());

        let mut stats = self.stats.write();
        if value.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.data.insert(key.to_string(), value);
        self.stats.write().writes += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let deleted = self.data.remove(key).is_some();
        if deleted {
            self.stats.write().deletes += 1;
        }
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.data.contains_key(key))
    }

    async fn clear(&self) -> Result<()> {
        self.data.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let stats = self.stats.read();
        Ok(CacheStats {
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            deletes: stats.deletes,
            size: self.data.len(),
        })
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();

        store.set("p1", b"{\"price\":\"42\"}".to_vec()).await.unwrap();
        let value = store.get("p1").await.unwrap();
        assert_eq!(value.as_deref(), Some(&b"{\"price\":\"42\"}"[..]));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryStore::new();
        store.set("p1", b"a".to_vec()).await.unwrap();
        store.set("p1", b"b".to_vec()).await.unwrap();

        assert_eq!(store.get("p1").await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.set("p1", b"a".to_vec()).await.unwrap();

        assert!(store.exists("p1").await.unwrap());
        assert!(store.delete("p1").await.unwrap());
        assert!(!store.delete("p1").await.unwrap());
        assert!(!store.exists("p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = MemoryStore::new();
        store.set("p1", b"a".to_vec()).await.unwrap();
        store.set("p2", b"b".to_vec()).await.unwrap();

        let _ = store.get("p1").await.unwrap();
        let _ = store.get("p3").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 2);
    }

    #[tokio::test]
    async fn test_clone_shares_data() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("p1", b"a".to_vec()).await.unwrap();
        assert!(other.exists("p1").await.unwrap());

        other.clear().await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }
}
