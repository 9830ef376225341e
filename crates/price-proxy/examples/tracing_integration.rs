use price_proxy::TracingMetrics;
use price_proxy::prelude::*;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing subscriber
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global subscriber was already installed");
    }

    // 2. Report hits, misses and latencies as tracing events
    let metrics = TracingMetrics::new().with_service_name("example-service");
    let (proxy, worker) = ProxyBuilder::in_memory(SimulatedPriceSource::new(Duration::from_millis(200)))
        .metrics(metrics)
        .start();

    let key = ProductKey::new("widget")?;

    println!("\nFirst lookup (miss)...");
    let first = proxy.lookup(&key).await?;
    println!("   Got: {} {}", first.origin.as_str(), first.record.price);

    println!("\nSecond lookup (hit)...");
    let second = proxy.lookup(&key).await?;
    println!("   Got: {} {}", second.origin.as_str(), second.record.price);

    worker.shutdown().await;
    Ok(())
}
