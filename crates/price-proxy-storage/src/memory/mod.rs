//! In-memory collaborators for single-process deployments and tests

mod bus;
mod queue;
mod store;

pub use bus::MemoryBus;
pub use queue::{DEFAULT_DEAD_LETTER_CAPACITY, MemoryQueue};
pub use store::MemoryStore;
