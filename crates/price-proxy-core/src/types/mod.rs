//! Core data model

mod job;
mod key;
mod notification;
mod record;
mod stats;

pub use job::{Admission, DeadLetter, FetchJob, JobOutcome};
pub use key::{MAX_KEY_LEN, ProductKey};
pub use notification::Notification;
pub use record::{CacheOrigin, PriceLookup, PriceRecord};
pub use stats::CacheStats;
