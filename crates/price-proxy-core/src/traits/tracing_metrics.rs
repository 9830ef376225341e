use crate::{ProxyMetrics, ProxyOperation};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Metrics adapter that logs events via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    /// Service name/prefix (optional)
    service_name: Option<String>,
}

impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with service name prefix
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
}

impl ProxyMetrics for TracingMetrics {
    fn record_hit(&self, key: &str) {
        debug!(
            target: "price_proxy",
            event = "hit",
            key = %key,
            service = ?self.service_name,
            "Price Cache Hit"
        );
    }

    fn record_miss(&self, key: &str) {
        debug!(
            target: "price_proxy",
            event = "miss",
            key = %key,
            service = ?self.service_name,
            "Price Cache Miss"
        );
    }

    fn record_coalesced(&self, key: &str) {
        debug!(
            target: "price_proxy",
            event = "coalesced",
            key = %key,
            service = ?self.service_name,
            "Joined Pending Fetch"
        );
    }

    fn record_fetch(&self, key: &str, success: bool, duration: Duration) {
        info!(
            target: "price_proxy",
            event = "fetch",
            key = %key,
            success = success,
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Upstream Fetch"
        );
    }

    fn record_latency(&self, operation: ProxyOperation, duration: Duration) {
        trace!(
            target: "price_proxy",
            event = "latency",
            operation = operation.as_str(),
            duration_ms = duration.as_millis(),
            service = ?self.service_name,
            "Proxy Operation Latency"
        );
    }
}
