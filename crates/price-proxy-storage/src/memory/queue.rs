//! In-memory deduplicating dispatch queue

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex as SyncMutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use price_proxy_core::{
    Admission, DeadLetter, DispatchQueue, FetchJob, JobOutcome, ProductKey, ProxyError, Result,
};

/// Default number of dead letters retained
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 100;

/// In-memory dispatch queue
///
/// Admission is decided on a `DashMap` entry, so concurrent submits for the
/// same key admit exactly one job. Cloning creates a new handle to the SAME
/// queue.
#[derive(Clone)]
pub struct MemoryQueue {
    /// key -> id of the outstanding job
    pending: Arc<DashMap<String, Uuid>>,
    tx: mpsc::UnboundedSender<FetchJob>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<FetchJob>>>,
    dead: Arc<SyncMutex<VecDeque<DeadLetter>>>,
    dead_letter_capacity: usize,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::with_dead_letter_capacity(DEFAULT_DEAD_LETTER_CAPACITY)
    }

    pub fn with_dead_letter_capacity(capacity: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            pending: Arc::new(DashMap::new()),
            tx,
            rx: Arc::new(Mutex::new(rx)),
            dead: Arc::new(SyncMutex::new(VecDeque::new())),
            dead_letter_capacity: capacity,
        }
    }

    /// Number of keys with an outstanding job
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn record_dead_letter(&self, letter: DeadLetter) {
        if self.dead_letter_capacity == 0 {
            return;
        }
        let mut dead = self.dead.lock();
        dead.push_front(letter);
        dead.truncate(self.dead_letter_capacity);
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DispatchQueue for MemoryQueue {
    async fn submit(&self, key: &ProductKey) -> Result<Admission> {
        let job = FetchJob::new(key.clone());
        match self.pending.entry(key.as_str().to_string()) {
            Entry::Occupied(_) => {
                debug!(key = %key, "fetch already pending");
                return Ok(Admission::AlreadyPending);
            }
            Entry::Vacant(v) => {
                v.insert(job.id);
            }
        }

        let id = job.id;
        if self.tx.send(job).is_err() {
            self.pending.remove_if(key.as_str(), |_, pending| *pending == id);
            return Err(ProxyError::QueueUnavailable("job channel closed".into()));
        }
        debug!(key = %key, job_id = %id, "fetch job admitted");
        Ok(Admission::Accepted)
    }

    async fn next_job(&self, timeout: Duration) -> Result<Option<FetchJob>> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(job)) => Ok(Some(job)),
            Ok(None) => Err(ProxyError::QueueUnavailable("job channel closed".into())),
            Err(_) => Ok(None),
        }
    }

    async fn complete(&self, job: &FetchJob, outcome: &JobOutcome) -> Result<()> {
        let cleared = self
            .pending
            .remove_if(job.key.as_str(), |_, pending| *pending == job.id)
            .is_some();
        if !cleared {
            warn!(key = %job.key, job_id = %job.id, "completed job no longer owned the key");
        }

        if let JobOutcome::Failed(reason) = outcome {
            self.record_dead_letter(DeadLetter::new(job, reason.clone()));
        }
        Ok(())
    }

    async fn is_pending(&self, key: &ProductKey) -> Result<bool> {
        Ok(self.pending.contains_key(key.as_str()))
    }

    async fn dead_letters(&self, limit: usize) -> Result<Vec<DeadLetter>> {
        Ok(self.dead.lock().iter().take(limit).cloned().collect())
    }
}
