//! Simulated external price source

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use price_proxy_core::{PriceRecord, PriceSource, ProductKey, Result};

/// Stand-in for a slow third-party pricing API
///
/// Every call sleeps for the configured delay, then answers with a random
/// whole price in `0..=100` and a fresh correlation id.
#[derive(Debug, Clone)]
pub struct SimulatedPriceSource {
    delay: Duration,
}

impl SimulatedPriceSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }
}

#[async_trait]
impl PriceSource for SimulatedPriceSource {
    async fn fetch(&self, key: &ProductKey) -> Result<PriceRecord> {
        info!(key = %key, delay_ms = self.delay.as_millis(), "external price request received");
        tokio::time::sleep(self.delay).await;

        let price = rand::rng().random_range(0..=100u32);
        PriceRecord::new(Decimal::from(price), Uuid::new_v4().to_string())
    }
}
