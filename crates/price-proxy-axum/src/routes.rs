use axum::{
    Json, Router,
    extract::Path,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use price_proxy_core::{ProductKey, ProxyError};
use price_proxy_http::{PriceBody, lookup_headers};

use crate::error::ApiError;
use crate::extractor::{Prices, SharedPriceService};
use crate::layer::RequestLogLayer;

/// Build the application router over `prices`
pub fn router(prices: SharedPriceService) -> Router {
    Router::new()
        .route("/v1/prices/{product}", get(get_price))
        .fallback(not_found)
        .layer(RequestLogLayer::new())
        .with_state(prices)
}

async fn get_price(prices: Prices, Path(product): Path<String>) -> Result<Response, ApiError> {
    let key = ProductKey::new(product)?;
    let lookup = prices.lookup(&key).await?;
    let headers =
        lookup_headers(&lookup).map_err(|e| ProxyError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, headers, Json(PriceBody::from(&lookup.record))).into_response())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
