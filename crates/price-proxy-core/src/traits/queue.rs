//! Dispatch queue trait

use std::time::Duration;

use crate::{Admission, DeadLetter, FetchJob, JobOutcome, ProductKey, Result};
use async_trait::async_trait;

/// Deduplicating work queue keyed by product
///
/// At most one job per key is outstanding at any time. A job is outstanding
/// from a successful `submit` until `complete` is called for it.
#[async_trait]
pub trait DispatchQueue: Send + Sync + 'static {
    /// Submit a fetch for `key`
    ///
    /// Returns `AlreadyPending` instead of an error when a job for the key
    /// is outstanding.
    async fn submit(&self, key: &ProductKey) -> Result<Admission>;

    /// Wait up to `timeout` for the next job
    async fn next_job(&self, timeout: Duration) -> Result<Option<FetchJob>>;

    /// Mark a job as finished and clear the key's pending state
    ///
    /// Pending state belonging to a newer job for the same key is left alone.
    /// Failed outcomes are recorded as dead letters.
    async fn complete(&self, job: &FetchJob, outcome: &JobOutcome) -> Result<()>;

    /// Check if a job for `key` is outstanding
    async fn is_pending(&self, key: &ProductKey) -> Result<bool>;

    /// Most recent failed jobs, newest first
    async fn dead_letters(&self, limit: usize) -> Result<Vec<DeadLetter>>;
}
