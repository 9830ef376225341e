use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use price_proxy_core::PriceService;
use std::sync::Arc;

/// Type-erased lookup service held in router state
pub type SharedPriceService = Arc<dyn PriceService>;

/// Extractor to access the lookup service from Axum handlers
pub struct Prices(pub SharedPriceService);

impl<State> FromRequestParts<State> for Prices
where
    State: Send + Sync,
    SharedPriceService: FromRef<State>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &State) -> Result<Self, Self::Rejection> {
        Ok(Prices(SharedPriceService::from_ref(state)))
    }
}

impl std::ops::Deref for Prices {
    type Target = dyn PriceService;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
