//! Axum front-end for price-proxy
//!
//! Serves `GET /v1/prices/{product}` over any `PriceService`, with one
//! request-log line per response.

pub mod config;
pub mod error;
pub mod extractor;
pub mod layer;
pub mod middleware;
pub mod routes;

pub use config::{ConfigError, LoggingConfig, RedisTarget, ServerConfig};
pub use error::ApiError;
pub use extractor::{Prices, SharedPriceService};
pub use layer::RequestLogLayer;
pub use routes::router;
