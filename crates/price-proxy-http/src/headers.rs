use http::header::InvalidHeaderValue;
use http::{HeaderMap, HeaderName, HeaderValue};
use price_proxy_core::PriceLookup;

/// `HIT` or `MISS`
pub const CACHE: HeaderName = HeaderName::from_static("cache");
/// The price as a plain decimal string
pub const PRICE: HeaderName = HeaderName::from_static("price");
/// Correlation id of the upstream fetch that produced the price
pub const REQUEST_ID: HeaderName = HeaderName::from_static("request-id");

/// Build the lookup response headers
///
/// Fails only if the correlation id holds bytes a header value cannot carry.
pub fn lookup_headers(lookup: &PriceLookup) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut map = HeaderMap::with_capacity(3);
    map.insert(CACHE, HeaderValue::from_static(lookup.origin.as_str()));
    map.insert(PRICE, HeaderValue::from_str(&lookup.record.price.to_string())?);
    map.insert(
        REQUEST_ID,
        HeaderValue::from_str(&lookup.record.correlation_id)?,
    );
    Ok(map)
}
