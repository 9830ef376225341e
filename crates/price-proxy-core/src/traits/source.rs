//! Upstream price source and inbound lookup service traits

use crate::{PriceLookup, PriceRecord, ProductKey, Result};
use async_trait::async_trait;

/// External, latency-bound price source
///
/// Not idempotent: every call yields a fresh correlation id, so callers that
/// must share a result must share a single call.
#[async_trait]
pub trait PriceSource: Send + Sync + 'static {
    /// Fetch the current price for `key`
    async fn fetch(&self, key: &ProductKey) -> Result<PriceRecord>;
}

/// Inbound price lookup, consumed by the HTTP layer
#[async_trait]
pub trait PriceService: Send + Sync + 'static {
    /// Look up the price for `key`, fetching it upstream on a miss
    async fn lookup(&self, key: &ProductKey) -> Result<PriceLookup>;
}
