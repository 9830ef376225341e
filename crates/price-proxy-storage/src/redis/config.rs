//! Configuration for Redis backends

use std::time::Duration;

/// Configuration shared by `RedisStore`, `RedisQueue` and `RedisBus`
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,

    /// Connection pool size
    pub pool_size: u32,

    /// Connection timeout
    pub connection_timeout: Duration,

    /// Optional key prefix for all keys, queues and channels (e.g., "prices")
    pub key_prefix: Option<String>,

    /// How long a pending-fetch marker survives a worker that never completes it
    pub pending_lease: Duration,

    /// Number of dead letters retained
    pub dead_letter_capacity: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            key_prefix: Some("prices".to_string()),
            pending_lease: Duration::from_secs(60),
            dead_letter_capacity: 100,
        }
    }
}

impl RedisConfig {
    /// Create new config with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Create config from a host and port
    pub fn from_host(host: &str, port: u16) -> Self {
        Self::new(format!("redis://{}:{}", host, port))
    }

    /// Set pool size
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Set key prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set pending-fetch lease
    pub fn pending_lease(mut self, lease: Duration) -> Self {
        self.pending_lease = lease;
        self
    }

    /// Apply the configured prefix to a name
    pub(crate) fn namespaced(&self, name: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, name),
            None => name.to_string(),
        }
    }

    /// Key holding the cached record for a product
    ///
    /// Records live under `price:` and queue state under `queue:`, so no
    /// product name can address a queue key.
    pub(crate) fn price_key(&self, key: &str) -> String {
        self.namespaced(&format!("price:{}", key))
    }

    /// Key for the queue's own state (`pending:{key}`, `jobs`, `dead`)
    pub(crate) fn queue_key(&self, name: &str) -> String {
        self.namespaced(&format!("queue:{}", name))
    }

    /// Pub/Sub channel for a topic
    pub(crate) fn channel(&self, topic: &str) -> String {
        self.namespaced(&format!("notify:{}", topic))
    }
}
