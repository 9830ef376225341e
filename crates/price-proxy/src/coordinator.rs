//! Coalescing lookup coordinator

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use price_proxy_core::{
    Admission, CacheStore, DispatchQueue, JsonSerializer, NoopMetrics, Notification,
    NotificationBus, PriceLookup, PriceRecord, PriceService, ProductKey, ProxyError,
    ProxyMetrics, ProxyOperation, Result, Serializer,
};

/// Configuration for PriceCoordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a lookup waits for a pending fetch before giving up
    ///
    /// `None` waits until the fetch finishes.
    pub wait_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl CoordinatorConfig {
    /// Create config with a specific wait timeout
    pub fn with_wait_timeout(timeout: Duration) -> Self {
        Self {
            wait_timeout: Some(timeout),
        }
    }

    /// Wait for pending fetches without a limit
    pub fn no_timeout(mut self) -> Self {
        self.wait_timeout = None;
        self
    }
}

/// Read-through price lookup with request coalescing
///
/// Holds no state of its own between calls: the cache store is the source
/// of truth for prices and the dispatch queue for in-flight fetches. A
/// waiting lookup owns only its bus subscription.
///
/// Generic over:
/// - `C`: the cache store
/// - `Q`: the dispatch queue
/// - `N`: the notification bus
/// - `S`: the record serializer
/// - `M`: the metrics collector
pub struct PriceCoordinator<C, Q, N, S = JsonSerializer, M = NoopMetrics>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    S: Serializer,
    M: ProxyMetrics,
{
    store: Arc<C>,
    queue: Arc<Q>,
    bus: Arc<N>,
    serializer: Arc<S>,
    metrics: Arc<M>,
    config: CoordinatorConfig,
}

impl<C, Q, N> PriceCoordinator<C, Q, N, JsonSerializer, NoopMetrics>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
{
    /// Create a coordinator with JSON records and no metrics
    pub fn new(store: Arc<C>, queue: Arc<Q>, bus: Arc<N>) -> Self {
        Self::with_config(store, queue, bus, CoordinatorConfig::default())
    }

    /// Create with custom config
    pub fn with_config(store: Arc<C>, queue: Arc<Q>, bus: Arc<N>, config: CoordinatorConfig) -> Self {
        Self::with_serializer_and_metrics(
            store,
            queue,
            bus,
            Arc::new(JsonSerializer),
            Arc::new(NoopMetrics),
            config,
        )
    }
}

impl<C, Q, N, S, M> PriceCoordinator<C, Q, N, S, M>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    S: Serializer,
    M: ProxyMetrics,
{
    /// Create a coordinator with custom serializer and metrics
    pub fn with_serializer_and_metrics(
        store: Arc<C>,
        queue: Arc<Q>,
        bus: Arc<N>,
        serializer: Arc<S>,
        metrics: Arc<M>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            queue,
            bus,
            serializer,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Look up the price for `key`
    ///
    /// Returns immediately with `HIT` when the cache holds a record. On a
    /// miss, joins (or starts) the single fetch for the key and returns its
    /// record with `MISS`; every caller coalesced onto one fetch receives
    /// the same record.
    pub async fn lookup(&self, key: &ProductKey) -> Result<PriceLookup> {
        let start = Instant::now();

        if let Some(record) = self.read_record(key).await? {
            self.metrics.record_hit(key.as_str());
            self.metrics
                .record_latency(ProxyOperation::Lookup, start.elapsed());
            return Ok(PriceLookup::hit(record));
        }
        self.metrics.record_miss(key.as_str());

        let record = match self.config.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, self.await_fetch(key))
                .await
                .map_err(|_| {
                    warn!(key = %key, timeout_ms = limit.as_millis(), "gave up waiting for fetch");
                    ProxyError::Timeout
                })??,
            None => self.await_fetch(key).await?,
        };

        self.metrics
            .record_latency(ProxyOperation::Lookup, start.elapsed());
        Ok(PriceLookup::miss(record))
    }

    /// Subscribe, submit, then wait for the key's fetch to finish
    ///
    /// The subscription is taken before the job is submitted so a worker
    /// that finishes immediately cannot publish before anyone listens. It is
    /// released when this future completes or is dropped.
    async fn await_fetch(&self, key: &ProductKey) -> Result<PriceRecord> {
        let subscribe_start = Instant::now();
        let mut subscription = self.bus.subscribe(key.as_str()).await?;
        self.metrics
            .record_latency(ProxyOperation::Subscribe, subscribe_start.elapsed());

        let submit_start = Instant::now();
        match self.queue.submit(key).await? {
            Admission::Accepted => debug!(key = %key, "started fetch"),
            Admission::AlreadyPending => {
                self.metrics.record_coalesced(key.as_str());
                debug!(key = %key, "joined pending fetch");
            }
        }
        self.metrics
            .record_latency(ProxyOperation::Submit, submit_start.elapsed());

        // A fetch that finished between the first read and the subscription
        // has already published; its record is in the cache.
        if let Some(record) = self.read_record(key).await? {
            return Ok(record);
        }

        let wait_start = Instant::now();
        loop {
            let notification = subscription.recv().await?;

            match notification {
                Notification::Ready => {
                    self.metrics
                        .record_latency(ProxyOperation::Wait, wait_start.elapsed());
                    return match self.read_record(key).await? {
                        Some(record) => Ok(record),
                        None => {
                            error!(key = %key, "ready notification without a cached record");
                            Err(ProxyError::MissingAfterNotify(key.to_string()))
                        }
                    };
                }
                Notification::Failed(reason) => {
                    // A failed job releases its key before publishing, so a
                    // key still pending here belongs to a newer job.
                    if matches!(self.queue.is_pending(key).await, Ok(true)) {
                        debug!(key = %key, reason = %reason, "earlier fetch failed; waiting on the newer one");
                        continue;
                    }
                    self.metrics
                        .record_latency(ProxyOperation::Wait, wait_start.elapsed());
                    debug!(key = %key, reason = %reason, "pending fetch failed");
                    return Err(ProxyError::fetch_failed(key.as_str(), reason));
                }
            }
        }
    }

    /// Read and decode the cached record for `key`
    async fn read_record(&self, key: &ProductKey) -> Result<Option<PriceRecord>> {
        let get_start = Instant::now();
        let raw = self.store.get(key.as_str()).await?;
        self.metrics
            .record_latency(ProxyOperation::CacheGet, get_start.elapsed());

        let Some(bytes) = raw else {
            return Ok(None);
        };
        let record: PriceRecord = self.serializer.deserialize(&bytes)?;
        record
            .validate()
            .map_err(|e| ProxyError::Deserialization(e.to_string()))?;
        Ok(Some(record))
    }
}

impl<C, Q, N, S, M> Clone for PriceCoordinator<C, Q, N, S, M>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    S: Serializer,
    M: ProxyMetrics,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            queue: self.queue.clone(),
            bus: self.bus.clone(),
            serializer: self.serializer.clone(),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl<C, Q, N, S, M> PriceService for PriceCoordinator<C, Q, N, S, M>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    S: Serializer,
    M: ProxyMetrics,
{
    async fn lookup(&self, key: &ProductKey) -> Result<PriceLookup> {
        PriceCoordinator::lookup(self, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.wait_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_no_timeout() {
        let config = CoordinatorConfig::with_wait_timeout(Duration::from_secs(1)).no_timeout();
        assert!(config.wait_timeout.is_none());
    }
}
