use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use price_proxy_core::ProxyError;
use price_proxy_http::{ErrorBody, status_for};
use thiserror::Error;
use tracing::warn;

/// Handler error rendered as a JSON body
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("no route for {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Proxy(err) => (status_for(err), ErrorBody::from(err)),
            ApiError::NotFound(path) => (StatusCode::NOT_FOUND, ErrorBody::not_found(path)),
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "lookup failed");
        }
        (status, Json(body)).into_response()
    }
}
