use price_proxy::prelude::*;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 1. Setup proxy over the in-memory collaborators with a slow source
    let source = SimulatedPriceSource::new(Duration::from_millis(500));
    let (proxy, worker) = ProxyBuilder::in_memory(source).start();

    let key = ProductKey::new("expensive_product")?;
    let mut handles = Vec::new();

    println!("Spawning 10 concurrent lookups for '{}'...", key);
    let started = Instant::now();

    // 2. Launch concurrent lookups
    for _ in 0..10 {
        let proxy = proxy.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move { proxy.lookup(&key).await }));
    }

    // 3. Collect results
    let mut correlation_ids = Vec::new();
    for h in handles {
        let lookup = h.await??;
        println!(
            "{} price={} request-id={}",
            lookup.origin.as_str(),
            lookup.record.price,
            lookup.record.correlation_id
        );
        correlation_ids.push(lookup.record.correlation_id);
    }
    println!("All lookups finished in {:?}", started.elapsed());

    // 4. Verify coalescing: one upstream call means one correlation id
    correlation_ids.dedup();
    if correlation_ids.len() != 1 {
        panic!(
            "Coalescing failed! Expected 1 upstream call, saw {}",
            correlation_ids.len()
        );
    }
    println!("SUCCESS: 10 lookups shared one upstream call.");

    // 5. A later lookup is a cache hit
    let again = proxy.lookup(&key).await?;
    println!("Follow-up lookup: {}", again.origin.as_str());

    worker.shutdown().await;
    Ok(())
}
