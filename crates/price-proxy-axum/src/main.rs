use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use price_proxy::{
    CacheStore, DispatchQueue, NotificationBus, ProxyBuilder, SimulatedPriceSource,
    TracingMetrics, WorkerHandle,
};
use price_proxy_axum::{ServerConfig, SharedPriceService, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    config.logging.init();

    let (prices, worker) = build_backend(&config).await?;
    let app = router(prices);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "price proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("server error")?;

    info!("draining fetch worker");
    worker.shutdown().await;
    Ok(())
}

fn start<C, Q, N>(store: C, queue: Q, bus: N, config: &ServerConfig) -> (SharedPriceService, WorkerHandle)
where
    C: CacheStore,
    Q: DispatchQueue,
    N: NotificationBus,
{
    let (proxy, worker) = ProxyBuilder::new(
        store,
        queue,
        bus,
        SimulatedPriceSource::new(config.external_call_delay),
    )
    .coordinator_config(config.coordinator_config())
    .worker_config(config.worker_config())
    .metrics(TracingMetrics::new().with_service_name("price-proxy"))
    .start();

    (Arc::new(proxy), worker)
}

fn start_in_memory(config: &ServerConfig) -> (SharedPriceService, WorkerHandle) {
    info!("using in-memory store, queue and bus");
    start(
        price_proxy::MemoryStore::new(),
        price_proxy::MemoryQueue::new(),
        price_proxy::MemoryBus::new(),
        config,
    )
}

#[cfg(feature = "redis")]
async fn build_backend(config: &ServerConfig) -> anyhow::Result<(SharedPriceService, WorkerHandle)> {
    use price_proxy::{RedisBus, RedisConfig, RedisQueue, RedisStore, build_redis_pool};

    let Some(target) = &config.redis else {
        return Ok(start_in_memory(config));
    };

    let redis_config = RedisConfig::from_host(&target.host, target.port);
    let pool = build_redis_pool(&redis_config)
        .await
        .with_context(|| format!("failed to connect to redis at {}:{}", target.host, target.port))?;
    info!(host = %target.host, port = target.port, "using redis store, queue and bus");

    let store = RedisStore::from_pool(pool.clone(), redis_config.clone());
    let queue = RedisQueue::from_pool(pool.clone(), redis_config.clone())?;
    let bus = RedisBus::from_pool(pool, redis_config)?;
    Ok(start(store, queue, bus, config))
}

#[cfg(not(feature = "redis"))]
async fn build_backend(config: &ServerConfig) -> anyhow::Result<(SharedPriceService, WorkerHandle)> {
    if config.redis.is_some() {
        warn!("REDIS_HOSTNAME is set but this build lacks the redis feature");
    }
    Ok(start_in_memory(config))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("could not install signal handlers; falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
