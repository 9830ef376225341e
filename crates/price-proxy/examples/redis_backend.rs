use price_proxy::prelude::*;
use price_proxy::{build_redis_pool, RedisBus, RedisConfig, RedisQueue, RedisStore};
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    println!("Connecting to Redis at {}", redis_url);

    let config = RedisConfig::new(redis_url).pool_size(5).prefix("example");
    let pool = match build_redis_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            println!("Skipping example, Redis not reachable: {}", e);
            return Ok(());
        }
    };

    // Store, queue and bus share one pool; the bus opens its own
    // pub/sub connections per subscription.
    let store = RedisStore::from_pool(pool.clone(), config.clone());
    let queue = RedisQueue::from_pool(pool.clone(), config.clone())?;
    let bus = RedisBus::from_pool(pool, config)?;

    let (proxy, worker) = ProxyBuilder::new(
        store,
        queue,
        bus,
        SimulatedPriceSource::new(Duration::from_millis(300)),
    )
    .start();

    let key = ProductKey::new("redis-widget")?;
    for _ in 0..2 {
        let lookup = proxy.lookup(&key).await?;
        println!(
            "{} price={} request-id={}",
            lookup.origin.as_str(),
            lookup.record.price,
            lookup.record.correlation_id
        );
    }

    worker.shutdown().await;
    Ok(())
}
