//! price-proxy-core: Core traits and types for the price-proxy workspace
//!
//! This crate provides the data model, error type and collaborator traits
//! (cache store, dispatch queue, notification bus, price source) that the
//! coalescing coordinator is written against.

mod error;
mod traits;
mod types;

pub use error::{ProxyError, Result};
pub use traits::*;
pub use types::*;
