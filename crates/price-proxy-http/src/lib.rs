//! HTTP response contract for price lookups
//!
//! Framework-agnostic pieces shared by any server front-end: the custom
//! response headers, the JSON bodies and the mapping from `ProxyError` to a
//! status code.

pub mod body;
pub mod headers;
pub mod status;

pub use body::{ErrorBody, PriceBody};
pub use headers::{CACHE, PRICE, REQUEST_ID, lookup_headers};
pub use status::{error_code, status_for};
