//! price-proxy-storage: Collaborator backends for price-proxy
//!
//! - `memory` (default): `MemoryStore`, `MemoryQueue`, `MemoryBus`
//! - `redis`: `RedisStore`, `RedisQueue`, `RedisBus` sharing one `RedisConfig`

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{MemoryBus, MemoryQueue, MemoryStore};

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "redis")]
pub use self::redis::{RedisBus, RedisConfig, RedisQueue, RedisStore};
