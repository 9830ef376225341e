use tower::Layer;

use crate::middleware::RequestLogMiddleware;

/// Logs one line per request: method, path, status, cache outcome, price,
/// request id and latency
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogLayer;

impl RequestLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogMiddleware::new(inner)
    }
}
