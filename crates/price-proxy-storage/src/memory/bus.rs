//! In-process notification bus

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::trace;

use price_proxy_core::{Notification, NotificationBus, Result, Subscription};

type Subscribers = HashMap<u64, mpsc::UnboundedSender<Notification>>;

/// In-process pub/sub keyed by topic
///
/// Each subscription owns an unbounded channel, so a slow waiter never
/// causes another waiter to miss a message. Topics with no subscribers are
/// removed as soon as their last subscription is dropped.
#[derive(Clone, Default)]
pub struct MemoryBus {
    topics: Arc<DashMap<String, Subscribers>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|subs| subs.len()).unwrap_or(0)
    }

    /// Number of topics with at least one live subscription
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

#[async_trait]
impl NotificationBus for MemoryBus {
    async fn publish(&self, topic: &str, notification: Notification) -> Result<usize> {
        let Some(subs) = self.topics.get(topic) else {
            trace!(topic, "publish with no subscribers");
            return Ok(0);
        };

        let delivered = subs
            .values()
            .filter(|tx| tx.send(notification.clone()).is_ok())
            .count();
        Ok(delivered)
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics
            .entry(topic.to_string())
            .or_default()
            .insert(id, tx);

        let topics = self.topics.clone();
        let name = topic.to_string();
        Ok(Subscription::new(topic, rx, move || {
            if let Some(mut subs) = topics.get_mut(&name) {
                subs.remove(&id);
            }
            topics.remove_if(&name, |_, subs| subs.is_empty());
        }))
    }
}
