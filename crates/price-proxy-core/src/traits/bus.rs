//! Notification bus trait and scoped subscriptions

use std::fmt;

use crate::{Notification, ProxyError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Publish/subscribe channel keyed by topic
#[async_trait]
pub trait NotificationBus: Send + Sync + 'static {
    /// Publish a notification on `topic`
    ///
    /// Returns the number of subscribers the message was handed to. Having
    /// no subscribers is not an error.
    async fn publish(&self, topic: &str, notification: Notification) -> Result<usize>;

    /// Subscribe to `topic`
    ///
    /// The subscription is active once this returns; anything published
    /// afterwards is delivered to it. Dropping the `Subscription`
    /// unsubscribes.
    async fn subscribe(&self, topic: &str) -> Result<Subscription>;
}

type Release = Box<dyn FnOnce() + Send + Sync>;

/// Active subscription to one topic
///
/// Released exactly once when dropped, on every exit path of the holder,
/// including cancellation of the future that owns it.
pub struct Subscription {
    topic: String,
    rx: mpsc::UnboundedReceiver<Notification>,
    release: Option<Release>,
}

impl Subscription {
    /// Wrap a receiver fed by the bus together with its release hook
    pub fn new<F>(topic: impl Into<String>, rx: mpsc::UnboundedReceiver<Notification>, release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            topic: topic.into(),
            rx,
            release: Some(Box::new(release)),
        }
    }

    /// Topic this subscription listens on
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next notification
    pub async fn recv(&mut self) -> Result<Notification> {
        self.rx.recv().await.ok_or_else(|| {
            ProxyError::BusUnavailable(format!("subscription to {} closed", self.topic))
        })
    }

    /// Take a notification if one is already queued
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
