//! Background fetch worker
//!
//! Drains the dispatch queue, calls the price source once per job, writes
//! the record to the cache and wakes the key's waiters.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use price_proxy_core::{
    CacheStore, DispatchQueue, FetchJob, JobOutcome, JsonSerializer, NoopMetrics, Notification,
    NotificationBus, PriceSource, ProductKey, ProxyError, ProxyMetrics, ProxyOperation, Result,
    Serializer,
};

/// Configuration for FetchWorker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Upper bound on fetches running at once
    pub max_concurrent_fetches: usize,
    /// How long one queue poll blocks before checking for shutdown
    pub poll_interval: Duration,
    /// Deadline for a single upstream call
    pub fetch_timeout: Duration,
    /// Pause after a failed queue poll
    pub error_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            poll_interval: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(10),
            error_backoff: Duration::from_millis(500),
        }
    }
}

impl WorkerConfig {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Executes fetch jobs taken from the dispatch queue
pub struct FetchWorker<C, Q, N, P, S = JsonSerializer, M = NoopMetrics>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    P: PriceSource,
    S: Serializer,
    M: ProxyMetrics,
{
    store: Arc<C>,
    queue: Arc<Q>,
    bus: Arc<N>,
    source: Arc<P>,
    serializer: Arc<S>,
    metrics: Arc<M>,
    config: WorkerConfig,
}

impl<C, Q, N, P> FetchWorker<C, Q, N, P, JsonSerializer, NoopMetrics>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    P: PriceSource,
{
    pub fn new(store: Arc<C>, queue: Arc<Q>, bus: Arc<N>, source: Arc<P>) -> Self {
        Self::with_serializer_and_metrics(
            store,
            queue,
            bus,
            source,
            Arc::new(JsonSerializer),
            Arc::new(NoopMetrics),
        )
    }
}

impl<C, Q, N, P, S, M> FetchWorker<C, Q, N, P, S, M>
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
    P: PriceSource,
    S: Serializer,
    M: ProxyMetrics,
{
    pub fn with_serializer_and_metrics(
        store: Arc<C>,
        queue: Arc<Q>,
        bus: Arc<N>,
        source: Arc<P>,
        serializer: Arc<S>,
        metrics: Arc<M>,
    ) -> Self {
        Self {
            store,
            queue,
            bus,
            source,
            serializer,
            metrics,
            config: WorkerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Start the poll loop on the current runtime
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = Arc::new(self);
        let task = tokio::spawn(worker.run(shutdown_rx));
        WorkerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.max(1)));
        info!(
            max_concurrent = self.config.max_concurrent_fetches,
            "fetch worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Hold a permit before popping so no job waits in memory unowned.
            // With every slot busy, shutdown must not wait for a fetch to end.
            let permit = tokio::select! {
                permit = Arc::clone(&permits).acquire_owned() => permit,
                Ok(()) = shutdown.changed() => continue,
            };
            let Ok(permit) = permit else {
                break;
            };

            match self.queue.next_job(self.config.poll_interval).await {
                Ok(Some(job)) => {
                    let worker = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _permit = permit;
                        worker.process(job).await;
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "dispatch queue poll failed");
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }

        info!("fetch worker stopped");
    }

    /// Run one job to completion
    ///
    /// On success the record is cached before `Ready` is published, and the
    /// key stays pending until after that. On failure the key is released
    /// first so the waiters woken by `Failed` can start a fresh fetch.
    pub async fn process(self: &Arc<Self>, job: FetchJob) -> JobOutcome {
        let start = Instant::now();
        let worker = Arc::clone(self);
        let key = job.key.clone();

        // The fetch runs in its own task so a panicking source surfaces as a
        // join error here instead of leaving the key pending.
        let result = match tokio::spawn(async move { worker.fetch_and_store(&key).await }).await {
            Ok(result) => result,
            Err(join_err) => {
                let reason = if join_err.is_panic() {
                    "price source panicked"
                } else {
                    "fetch task cancelled"
                };
                error!(key = %job.key, job_id = %job.id, "{}", reason);
                Err(ProxyError::fetch_failed(job.key.as_str(), reason))
            }
        };

        match result {
            Ok(fetched) => {
                if fetched {
                    self.metrics
                        .record_fetch(job.key.as_str(), true, start.elapsed());
                }
                self.publish(&job.key, Notification::Ready).await;
                self.finish(&job, JobOutcome::Completed).await
            }
            Err(err) => {
                let reason = match err {
                    ProxyError::FetchFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                self.metrics
                    .record_fetch(job.key.as_str(), false, start.elapsed());
                warn!(key = %job.key, job_id = %job.id, reason = %reason, "fetch failed");

                let outcome = self.finish(&job, JobOutcome::Failed(reason.clone())).await;
                self.publish(&job.key, Notification::Failed(reason)).await;
                outcome
            }
        }
    }

    /// Fetch and cache the record, unless a previous job already did
    ///
    /// Returns whether the source was called.
    async fn fetch_and_store(&self, key: &ProductKey) -> Result<bool> {
        if self.store.get(key.as_str()).await?.is_some() {
            debug!(key = %key, "record already cached; skipping upstream call");
            return Ok(false);
        }

        debug!(key = %key, "calling price source");
        let record = tokio::time::timeout(self.config.fetch_timeout, self.source.fetch(key))
            .await
            .map_err(|_| {
                ProxyError::fetch_failed(
                    key.as_str(),
                    format!("no response within {:?}", self.config.fetch_timeout),
                )
            })??;
        record.validate()?;

        let bytes = self.serializer.serialize(&record)?;
        let set_start = Instant::now();
        self.store.set(key.as_str(), bytes).await?;
        self.metrics
            .record_latency(ProxyOperation::CacheSet, set_start.elapsed());

        info!(key = %key, price = %record.price, correlation_id = %record.correlation_id, "price cached");
        Ok(true)
    }

    async fn publish(&self, key: &ProductKey, notification: Notification) {
        let start = Instant::now();
        match self.bus.publish(key.as_str(), notification).await {
            Ok(delivered) => debug!(key = %key, delivered, "waiters notified"),
            Err(e) => error!(key = %key, error = %e, "notification publish failed"),
        }
        self.metrics
            .record_latency(ProxyOperation::Publish, start.elapsed());
    }

    async fn finish(&self, job: &FetchJob, outcome: JobOutcome) -> JobOutcome {
        if let Err(e) = self.queue.complete(job, &outcome).await {
            error!(key = %job.key, job_id = %job.id, error = %e, "failed to release pending key");
        }
        outcome
    }
}

/// Handle to a running worker loop
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Stop polling and wait for the loop to exit
    ///
    /// Jobs already taken keep running to completion on the runtime.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "fetch worker exited abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = WorkerConfig::default()
            .with_fetch_timeout(Duration::from_millis(250))
            .with_max_concurrent_fetches(4)
            .with_poll_interval(Duration::from_millis(10));

        assert_eq!(config.fetch_timeout, Duration::from_millis(250));
        assert_eq!(config.max_concurrent_fetches, 4);
        assert_eq!(config.poll_interval, Duration::from_millis(10));
    }
}
