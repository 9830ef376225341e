//! Dispatch queue job types

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use super::key::ProductKey;

/// A unit of fetch work delivered to the worker
///
/// Carries nothing beyond the key; the worker derives what to fetch from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchJob {
    /// Unique id of this admission
    pub id: Uuid,
    /// Key to fetch
    pub key: ProductKey,
    /// When the job was admitted
    pub enqueued_at: SystemTime,
}

impl FetchJob {
    pub fn new(key: ProductKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            enqueued_at: SystemTime::now(),
        }
    }
}

/// Result of submitting a key to the dispatch queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new job was created for the key
    Accepted,
    /// A job for the key is already outstanding; nothing was enqueued
    AlreadyPending,
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

/// How a job finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
}

/// A failed job kept by the queue for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub job_id: Uuid,
    pub key: ProductKey,
    pub reason: String,
    pub failed_at: SystemTime,
}

impl DeadLetter {
    pub fn new(job: &FetchJob, reason: impl Into<String>) -> Self {
        Self {
            job_id: job.id,
            key: job.key.clone(),
            reason: reason.into(),
            failed_at: SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_get_distinct_ids() {
        let key = ProductKey::new("p1").unwrap();
        let a = FetchJob::new(key.clone());
        let b = FetchJob::new(key);
        assert_ne!(a.id, b.id);
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn test_dead_letter_from_job() {
        let job = FetchJob::new(ProductKey::new("p1").unwrap());
        let letter = DeadLetter::new(&job, "upstream timeout");
        assert_eq!(letter.job_id, job.id);
        assert_eq!(letter.key.as_str(), "p1");
        assert_eq!(letter.reason, "upstream timeout");
    }

    #[test]
    fn test_admission() {
        assert!(Admission::Accepted.is_accepted());
        assert!(!Admission::AlreadyPending.is_accepted());
    }
}
