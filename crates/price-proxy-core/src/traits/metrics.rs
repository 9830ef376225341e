//! Metrics trait for proxy observability

use std::time::Duration;

/// Proxy operation for latency tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyOperation {
    Lookup,
    CacheGet,
    CacheSet,
    Subscribe,
    Submit,
    Wait,
    Publish,
}

impl ProxyOperation {
    /// Get operation as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyOperation::Lookup => "lookup",
            ProxyOperation::CacheGet => "cache_get",
            ProxyOperation::CacheSet => "cache_set",
            ProxyOperation::Subscribe => "subscribe",
            ProxyOperation::Submit => "submit",
            ProxyOperation::Wait => "wait",
            ProxyOperation::Publish => "publish",
        }
    }
}

/// Trait for proxy metrics/observability
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait ProxyMetrics: Send + Sync + 'static {
    /// Record a lookup served from the cache
    fn record_hit(&self, key: &str);

    /// Record a lookup that had to wait on a fetch
    fn record_miss(&self, key: &str);

    /// Record a lookup that joined a fetch already pending
    fn record_coalesced(&self, key: &str);

    /// Record an upstream fetch and how long it took
    fn record_fetch(&self, key: &str, success: bool, duration: Duration);

    /// Record operation latency
    fn record_latency(&self, operation: ProxyOperation, duration: Duration);
}

/// No-op metrics implementation (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl ProxyMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _key: &str) {}

    #[inline]
    fn record_miss(&self, _key: &str) {}

    #[inline]
    fn record_coalesced(&self, _key: &str) {}

    #[inline]
    fn record_fetch(&self, _key: &str, _success: bool, _duration: Duration) {}

    #[inline]
    fn record_latency(&self, _operation: ProxyOperation, _duration: Duration) {}
}

/// Metrics adapter using the `metrics` crate
///
/// # Example
/// ```ignore
/// use price_proxy_core::MetricsCrateAdapter;
///
/// let metrics = MetricsCrateAdapter::new("price_proxy");
/// // Emits: price_proxy_hits_total, price_proxy_fetches_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl ProxyMetrics for MetricsCrateAdapter {
    fn record_hit(&self, _key: &str) {
        metrics::counter!(self.metric_name("hits_total")).increment(1);
    }

    fn record_miss(&self, _key: &str) {
        metrics::counter!(self.metric_name("misses_total")).increment(1);
    }

    fn record_coalesced(&self, _key: &str) {
        metrics::counter!(self.metric_name("coalesced_total")).increment(1);
    }

    fn record_fetch(&self, _key: &str, success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "failure" };
        metrics::counter!(self.metric_name("fetches_total"), "outcome" => outcome).increment(1);
        metrics::histogram!(self.metric_name("fetch_duration_seconds"))
            .record(duration.as_secs_f64());
    }

    fn record_latency(&self, operation: ProxyOperation, duration: Duration) {
        metrics::histogram!(
            self.metric_name("operation_duration_seconds"),
            "operation" => operation.as_str()
        )
        .record(duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_as_str() {
        assert_eq!(ProxyOperation::Lookup.as_str(), "lookup");
        assert_eq!(ProxyOperation::CacheGet.as_str(), "cache_get");
        assert_eq!(ProxyOperation::Wait.as_str(), "wait");
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoopMetrics;
        metrics.record_hit("key");
        metrics.record_miss("key");
        metrics.record_fetch("key", true, Duration::from_millis(1));
        metrics.record_latency(ProxyOperation::Lookup, Duration::from_millis(1));
    }
}
