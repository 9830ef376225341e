use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use parking_lot::RwLock as SyncRwLock;
use redis::AsyncCommands;
use std::sync::Arc;

use price_proxy_core::{CacheStats, CacheStore, ProxyError, Result};

use super::config::RedisConfig;

/// Redis cache store
///
/// Values are stored as plain strings under `{prefix}:price:{key}` with no
/// expiry.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
    stats: Arc<SyncRwLock<CacheStats>>,
}

impl RedisStore {
    /// Create a new Redis store with its own pool
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = super::build_pool(&config).await?;
        Ok(Self::from_pool(pool, config))
    }

    /// Create a store on an existing pool
    pub fn from_pool(pool: Pool<RedisConnectionManager>, config: RedisConfig) -> Self {
        Self {
            pool,
            config,
            stats: Arc::new(SyncRwLock::new(CacheStats::default())),
        }
    }

    fn prefixed_key(&self, key: &str) -> String {
        self.config.price_key(key)
    }

    /// Pattern matching every record this store owns
    fn match_pattern(&self) -> String {
        self.config.price_key("*")
    }

    async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))
    }

    /// Collect the keys of every cached record
    async fn scan_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(self.match_pattern())
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut *conn)
                .await
                .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))?;

            found.extend(keys);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;
        let value: Option<Vec<u8>> = conn
            .get(self.prefixed_key(key))
            .await
            .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))?;

        let mut stats = self.stats.write();
        if value.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn
            .set(self.prefixed_key(key), value)
            .await
            .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))?;

        self.stats.write().writes += 1;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let deleted: u64 = conn
            .del(self.prefixed_key(key))
            .await
            .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))?;

        if deleted > 0 {
            self.stats.write().deletes += 1;
        }
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        conn.exists(self.prefixed_key(key))
            .await
            .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))
    }

    async fn clear(&self) -> Result<()> {
        let keys = self.scan_keys().await?;
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_connection().await?;
        for chunk in keys.chunks(1000) {
            let _: usize = conn
                .unlink(chunk)
                .await
                .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))?;
        }
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let mut stats = self.stats.read().clone();
        stats.size = self.len().await?;
        Ok(stats)
    }

    // O(N) scan over the prefix; intended for diagnostics, not hot paths
    async fn len(&self) -> Result<usize> {
        Ok(self.scan_keys().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::build_pool;
    use crate::redis::fake::FakeRedis;
    use price_proxy_core::{DispatchQueue, ProductKey};

    async fn store_on(server: &FakeRedis) -> RedisStore {
        let config = RedisConfig::new(server.url());
        let pool = build_pool(&config).await.unwrap();
        RedisStore::from_pool(pool, config)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let server = FakeRedis::start().await;
        let store = store_on(&server).await;

        assert_eq!(store.get("p1").await.unwrap(), None);
        store.set("p1", b"{\"price\":1}".to_vec()).await.unwrap();
        assert_eq!(store.get("p1").await.unwrap(), Some(b"{\"price\":1}".to_vec()));
        assert!(store.exists("p1").await.unwrap());
        assert!(server.has_string("prices:price:p1"));

        assert!(store.delete("p1").await.unwrap());
        assert!(!store.delete("p1").await.unwrap());
        assert!(!store.exists("p1").await.unwrap());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.deletes, 1);
    }

    #[tokio::test]
    async fn test_clear_leaves_queue_state_alone() {
        let server = FakeRedis::start().await;
        let config = RedisConfig::new(server.url());
        let pool = build_pool(&config).await.unwrap();
        let store = RedisStore::from_pool(pool.clone(), config.clone());
        let queue = crate::redis::RedisQueue::from_pool(pool, config).unwrap();

        let pending = ProductKey::new("p1").unwrap();
        queue.submit(&pending).await.unwrap();
        store.set("a", b"1".to_vec()).await.unwrap();
        store.set("b", b"2".to_vec()).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);

        store.clear().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
        assert!(queue.is_pending(&pending).await.unwrap());
    }
}
