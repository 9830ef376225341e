//! Wiring of coordinator and worker over shared collaborators

use std::sync::Arc;

use price_proxy_core::{
    CacheStore, DispatchQueue, JsonSerializer, NoopMetrics, NotificationBus, PriceSource,
    ProxyMetrics, Serializer,
};

use crate::coordinator::{CoordinatorConfig, PriceCoordinator};
use crate::worker::{FetchWorker, WorkerConfig, WorkerHandle};

/// Builder for a coordinator and fetch worker sharing one store, queue and bus
///
/// # Example
///
/// ```rust,no_run
/// use price_proxy::prelude::*;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
///     let (proxy, worker) = ProxyBuilder::in_memory(SimulatedPriceSource::from_millis(500))
///         .coordinator_config(CoordinatorConfig::with_wait_timeout(Duration::from_secs(5)))
///         .start();
///
///     let lookup = proxy.lookup(&ProductKey::new("widget")?).await?;
///     println!("{} {}", lookup.origin.as_str(), lookup.record.price);
///
///     worker.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ProxyBuilder<C, Q, N, P, S = JsonSerializer, M = NoopMetrics> {
    store: Arc<C>,
    queue: Arc<Q>,
    bus: Arc<N>,
    source: Arc<P>,
    serializer: Arc<S>,
    metrics: Arc<M>,
    coordinator: CoordinatorConfig,
    worker: WorkerConfig,
}

impl<C, Q, N, P> ProxyBuilder<C, Q, N, P, JsonSerializer, NoopMetrics>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    P: PriceSource,
{
    pub fn new(store: C, queue: Q, bus: N, source: P) -> Self {
        Self::from_shared(
            Arc::new(store),
            Arc::new(queue),
            Arc::new(bus),
            Arc::new(source),
        )
    }

    /// Build on collaborators the caller keeps handles to
    pub fn from_shared(store: Arc<C>, queue: Arc<Q>, bus: Arc<N>, source: Arc<P>) -> Self {
        Self {
            store,
            queue,
            bus,
            source,
            serializer: Arc::new(JsonSerializer),
            metrics: Arc::new(NoopMetrics),
            coordinator: CoordinatorConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

#[cfg(feature = "memory")]
impl<P: PriceSource>
    ProxyBuilder<
        price_proxy_storage::MemoryStore,
        price_proxy_storage::MemoryQueue,
        price_proxy_storage::MemoryBus,
        P,
        JsonSerializer,
        NoopMetrics,
    >
{
    /// Single-process setup on the in-memory collaborators
    pub fn in_memory(source: P) -> Self {
        Self::new(
            price_proxy_storage::MemoryStore::new(),
            price_proxy_storage::MemoryQueue::new(),
            price_proxy_storage::MemoryBus::new(),
            source,
        )
    }
}

impl<C, Q, N, P, S, M> ProxyBuilder<C, Q, N, P, S, M>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    P: PriceSource,
    S: Serializer,
    M: ProxyMetrics,
{
    pub fn coordinator_config(mut self, config: CoordinatorConfig) -> Self {
        self.coordinator = config;
        self
    }

    pub fn worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker = config;
        self
    }

    /// Replace the record serializer
    pub fn serializer<S2: Serializer>(self, serializer: S2) -> ProxyBuilder<C, Q, N, P, S2, M> {
        ProxyBuilder {
            store: self.store,
            queue: self.queue,
            bus: self.bus,
            source: self.source,
            serializer: Arc::new(serializer),
            metrics: self.metrics,
            coordinator: self.coordinator,
            worker: self.worker,
        }
    }

    /// Replace the metrics collector
    pub fn metrics<M2: ProxyMetrics>(self, metrics: M2) -> ProxyBuilder<C, Q, N, P, S, M2> {
        ProxyBuilder {
            store: self.store,
            queue: self.queue,
            bus: self.bus,
            source: self.source,
            serializer: self.serializer,
            metrics: Arc::new(metrics),
            coordinator: self.coordinator,
            worker: self.worker,
        }
    }

    /// Build both halves without starting the worker
    pub fn build(self) -> (PriceCoordinator<C, Q, N, S, M>, FetchWorker<C, Q, N, P, S, M>) {
        let coordinator = PriceCoordinator::with_serializer_and_metrics(
            Arc::clone(&self.store),
            Arc::clone(&self.queue),
            Arc::clone(&self.bus),
            Arc::clone(&self.serializer),
            Arc::clone(&self.metrics),
            self.coordinator,
        );
        let worker = FetchWorker::with_serializer_and_metrics(
            self.store,
            self.queue,
            self.bus,
            self.source,
            self.serializer,
            self.metrics,
        )
        .with_config(self.worker);
        (coordinator, worker)
    }

    /// Build and spawn the worker on the current runtime
    pub fn start(self) -> (PriceCoordinator<C, Q, N, S, M>, WorkerHandle) {
        let (coordinator, worker) = self.build();
        (coordinator, worker.spawn())
    }
}
