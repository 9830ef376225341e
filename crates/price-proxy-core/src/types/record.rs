//! Price record and lookup result types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ProxyError, Result};

/// A price fetched from the external source
///
/// The serialized form is the cache value. Records never expire; once
/// written for a key they are served as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    /// Non-negative price
    pub price: Decimal,
    /// Unique token generated per upstream fetch
    pub correlation_id: String,
}

impl PriceRecord {
    /// Create a validated record
    pub fn new(price: Decimal, correlation_id: impl Into<String>) -> Result<Self> {
        let record = Self {
            price,
            correlation_id: correlation_id.into(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<()> {
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ProxyError::InvalidRecord(format!(
                "price {} is negative",
                self.price
            )));
        }
        if self.correlation_id.is_empty() {
            return Err(ProxyError::InvalidRecord(
                "correlation id is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where a lookup result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheOrigin {
    /// Served from the cache without waiting
    Hit,
    /// Served after waiting on an upstream fetch
    Miss,
}

impl CacheOrigin {
    /// Get origin as header label
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOrigin::Hit => "HIT",
            CacheOrigin::Miss => "MISS",
        }
    }
}

/// Result of a price lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLookup {
    pub record: PriceRecord,
    pub origin: CacheOrigin,
}

impl PriceLookup {
    pub fn hit(record: PriceRecord) -> Self {
        Self {
            record,
            origin: CacheOrigin::Hit,
        }
    }

    pub fn miss(record: PriceRecord) -> Self {
        Self {
            record,
            origin: CacheOrigin::Miss,
        }
    }

    /// Check if this lookup was served from the cache
    pub fn is_hit(&self) -> bool {
        self.origin == CacheOrigin::Hit
    }

    /// Extract the record, consuming the lookup
    pub fn into_record(self) -> PriceRecord {
        self.record
    }
}
