//! Redis-backed deduplicating dispatch queue
//!
//! A key is pending while `{prefix}:queue:pending:{key}` holds the id of its
//! job. Admission sets that marker with NX and pushes the job in one script,
//! so two instances can never admit the same key twice. The marker carries a
//! lease so a worker that dies mid-job cannot orphan the key forever.
//!
//! BLPOP runs on its own connection with no reply timeout. A pooled
//! connection gives up on replies after a fixed deadline, and an abandoned
//! BLPOP still pops the next job on the server, losing it.

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Script};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use price_proxy_core::{
    Admission, DeadLetter, DispatchQueue, FetchJob, JobOutcome, ProductKey, ProxyError, Result,
};

use super::config::RedisConfig;

const SUBMIT_SCRIPT: &str = r#"
if redis.call('SET', KEYS[1], ARGV[1], 'NX', 'PX', ARGV[2]) then
  redis.call('RPUSH', KEYS[2], ARGV[3])
  return 1
end
return 0
"#;

const COMPLETE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// Redis dispatch queue
#[derive(Clone)]
pub struct RedisQueue {
    pool: Pool<RedisConnectionManager>,
    client: redis::Client,
    blocking: Arc<OnceCell<ConnectionManager>>,
    config: RedisConfig,
}

impl RedisQueue {
    /// Create a new Redis queue with its own pool
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = super::build_pool(&config).await?;
        Self::from_pool(pool, config)
    }

    /// Create a queue on an existing pool
    ///
    /// The pool serves every command except BLPOP, which gets a dedicated
    /// connection opened on first poll.
    pub fn from_pool(pool: Pool<RedisConnectionManager>, config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(queue_err)?;
        Ok(Self {
            pool,
            client,
            blocking: Arc::new(OnceCell::new()),
            config,
        })
    }

    fn pending_key(&self, key: &ProductKey) -> String {
        self.config
            .queue_key(&format!("pending:{}", key.as_str()))
    }

    fn jobs_key(&self) -> String {
        self.config.queue_key("jobs")
    }

    fn dead_key(&self) -> String {
        self.config.queue_key("dead")
    }

    /// Connection reserved for BLPOP; replies may take the whole poll interval
    async fn blocking_connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .blocking
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_connection_timeout(Some(self.config.connection_timeout))
                    .set_response_timeout(None);
                self.client.get_connection_manager_with_config(config).await
            })
            .await
            .map_err(queue_err)?;
        Ok(conn.clone())
    }

    async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| ProxyError::QueueUnavailable(e.to_string()))
    }
}

fn queue_err(e: redis::RedisError) -> ProxyError {
    ProxyError::QueueUnavailable(e.to_string())
}

#[async_trait]
impl DispatchQueue for RedisQueue {
    async fn submit(&self, key: &ProductKey) -> Result<Admission> {
        let job = FetchJob::new(key.clone());
        let payload =
            serde_json::to_string(&job).map_err(|e| ProxyError::Serialization(e.to_string()))?;
        let lease_ms = self.config.pending_lease.as_millis() as u64;

        let mut conn = self.get_connection().await?;
        let admitted: i64 = Script::new(SUBMIT_SCRIPT)
            .key(self.pending_key(key))
            .key(self.jobs_key())
            .arg(job.id.to_string())
            .arg(lease_ms)
            .arg(payload)
            .invoke_async(&mut *conn)
            .await
            .map_err(queue_err)?;

        if admitted == 1 {
            debug!(key = %key, job_id = %job.id, "fetch job admitted");
            Ok(Admission::Accepted)
        } else {
            debug!(key = %key, "fetch already pending");
            Ok(Admission::AlreadyPending)
        }
    }

    async fn next_job(&self, timeout: Duration) -> Result<Option<FetchJob>> {
        let mut conn = self.blocking_connection().await?;
        let popped: Option<(String, String)> = conn
            .blpop(self.jobs_key(), timeout.as_secs_f64())
            .await
            .map_err(queue_err)?;

        match popped {
            Some((_, payload)) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| ProxyError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn complete(&self, job: &FetchJob, outcome: &JobOutcome) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let cleared: i64 = Script::new(COMPLETE_SCRIPT)
            .key(self.pending_key(&job.key))
            .arg(job.id.to_string())
            .invoke_async(&mut *conn)
            .await
            .map_err(queue_err)?;
        if cleared == 0 {
            warn!(key = %job.key, job_id = %job.id, "completed job no longer owned the key");
        }

        if let JobOutcome::Failed(reason) = outcome {
            let letter = DeadLetter::new(job, reason.clone());
            let payload = serde_json::to_string(&letter)
                .map_err(|e| ProxyError::Serialization(e.to_string()))?;
            let capacity = self.config.dead_letter_capacity.max(1) as isize;

            let mut pipe = redis::pipe();
            pipe.atomic()
                .lpush(self.dead_key(), payload)
                .ltrim(self.dead_key(), 0, capacity - 1);
            let _: () = pipe.query_async(&mut *conn).await.map_err(queue_err)?;
        }
        Ok(())
    }

    async fn is_pending(&self, key: &ProductKey) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        conn.exists(self.pending_key(key)).await.map_err(queue_err)
    }

    async fn dead_letters(&self, limit: usize) -> Result<Vec<DeadLetter>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.get_connection().await?;
        let raw: Vec<String> = conn
            .lrange(self.dead_key(), 0, limit as isize - 1)
            .await
            .map_err(queue_err)?;

        raw.iter()
            .map(|payload| {
                serde_json::from_str(payload)
                    .map_err(|e| ProxyError::Deserialization(e.to_string()))
            })
            .collect()
    }
}
