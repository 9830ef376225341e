//! price-proxy: Read-through price cache with request coalescing
//!
//! # Features
//!
//! - **Read-through lookups** served from a shared cache
//! - **Request coalescing**: concurrent misses for one product share a single upstream call
//! - **Pluggable collaborators** (in-memory or Redis store, queue and bus)
//! - **Pluggable serialization** (JSON, MessagePack)
//! - **Metrics integration**
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use price_proxy::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let (proxy, worker) = ProxyBuilder::in_memory(SimulatedPriceSource::from_millis(1000)).start();
//!
//!     let key = ProductKey::new("widget")?;
//!     let first = proxy.lookup(&key).await?;   // MISS, waits on the source
//!     let second = proxy.lookup(&key).await?;  // HIT, same record
//!     assert_eq!(first.record, second.record);
//!
//!     worker.shutdown().await;
//!     Ok(())
//! }
//! ```

mod builder;
mod coordinator;
mod source;
mod worker;

// Re-export core
pub use price_proxy_core::*;

// Re-export storage
#[cfg(feature = "memory")]
pub use price_proxy_storage::{MemoryBus, MemoryQueue, MemoryStore};

#[cfg(feature = "redis")]
pub use price_proxy_storage::{RedisBus, RedisConfig, RedisQueue, RedisStore};

#[cfg(feature = "redis")]
pub use price_proxy_storage::redis::build_pool as build_redis_pool;

pub use builder::ProxyBuilder;
pub use coordinator::{CoordinatorConfig, PriceCoordinator};
pub use source::SimulatedPriceSource;
pub use worker::{FetchWorker, WorkerConfig, WorkerHandle};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CacheOrigin, CoordinatorConfig, JsonSerializer, PriceCoordinator, PriceLookup,
        PriceRecord, PriceService, PriceSource, ProductKey, ProxyBuilder, ProxyError, Result,
        Serializer, SimulatedPriceSource, WorkerConfig, WorkerHandle,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryBus, MemoryQueue, MemoryStore};

    #[cfg(feature = "msgpack")]
    pub use crate::MsgPackSerializer;
}
