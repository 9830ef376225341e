//! Redis collaborators for multi-instance deployments

mod bus;
mod config;
mod queue;
mod store;

#[cfg(test)]
mod fake;

pub use bus::RedisBus;
pub use config::RedisConfig;
pub use queue::RedisQueue;
pub use store::RedisStore;

use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use price_proxy_core::{ProxyError, Result};

/// Build a connection pool from `config`
///
/// Store, queue and bus can share one pool via their `from_pool` constructors.
pub async fn build_pool(config: &RedisConfig) -> Result<Pool<RedisConnectionManager>> {
    let manager = RedisConnectionManager::new(config.url.as_str())
        .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))?;

    Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .await
        .map_err(|e| ProxyError::CacheUnavailable(e.to_string()))
}
