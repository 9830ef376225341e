//! Collaborator traits consumed by the coordinator

mod bus;
mod metrics;
mod queue;
mod serializer;
mod source;
mod store;
mod tracing_metrics;

pub use bus::{NotificationBus, Subscription};
pub use metrics::{NoopMetrics, ProxyMetrics, ProxyOperation};
pub use queue::DispatchQueue;
pub use serializer::{JsonSerializer, Serializer};
pub use source::{PriceService, PriceSource};
pub use store::CacheStore;
pub use tracing_metrics::TracingMetrics;

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "msgpack")]
pub use serializer::MsgPackSerializer;
