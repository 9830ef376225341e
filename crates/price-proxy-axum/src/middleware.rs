use axum::{
    body::Body,
    http::{Request, Response},
};
use price_proxy_http::{CACHE, PRICE, REQUEST_ID};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower_service::Service;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RequestLogMiddleware<S> {
    inner: S,
}

impl<S> RequestLogMiddleware<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

fn header_or_dash<'a>(res: &'a Response<Body>, name: &http::HeaderName) -> &'a str {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

impl<S> Service<Request<Body>> for RequestLogMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Keep the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = inner.call(req).await?;

            info!(
                target: "price_proxy::http",
                method = %method,
                path = %path,
                status = res.status().as_u16(),
                cache = header_or_dash(&res, &CACHE),
                price = header_or_dash(&res, &PRICE),
                request_id = header_or_dash(&res, &REQUEST_ID),
                latency_ms = start.elapsed().as_millis() as u64,
                "request served"
            );
            Ok(res)
        })
    }
}
