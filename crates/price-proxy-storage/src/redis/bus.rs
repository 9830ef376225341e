//! Redis Pub/Sub notification bus
//!
//! Lets waiters on one instance be released by a worker running on another
//! instance sharing the same Redis. Each subscription holds a dedicated
//! pub/sub connection; dropping the subscription stops its listener task,
//! which closes the connection and with it the Redis subscription.

use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use price_proxy_core::{Notification, NotificationBus, ProxyError, Result, Subscription};

use super::config::RedisConfig;

/// Redis notification bus
#[derive(Clone)]
pub struct RedisBus {
    client: redis::Client,
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
}

impl RedisBus {
    /// Create a new Redis bus with its own pool
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = super::build_pool(&config).await?;
        Self::from_pool(pool, config)
    }

    /// Create a bus publishing through an existing pool
    pub fn from_pool(pool: Pool<RedisConnectionManager>, config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| ProxyError::BusUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            pool,
            config,
        })
    }

    fn channel(&self, topic: &str) -> String {
        self.config.channel(topic)
    }
}

fn bus_err(e: impl std::fmt::Display) -> ProxyError {
    ProxyError::BusUnavailable(e.to_string())
}

#[async_trait]
impl NotificationBus for RedisBus {
    async fn publish(&self, topic: &str, notification: Notification) -> Result<usize> {
        let mut conn = self.pool.get().await.map_err(bus_err)?;
        let receivers: usize = conn
            .publish(self.channel(topic), notification.to_message())
            .await
            .map_err(bus_err)?;
        Ok(receivers)
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        let channel = self.channel(topic);
        let mut pubsub = self.client.get_async_pubsub().await.map_err(bus_err)?;
        pubsub.subscribe(&channel).await.map_err(bus_err)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let listener = tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(msg) = messages.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(channel = %channel, error = %e, "unreadable notification payload");
                        continue;
                    }
                };
                let Some(notification) = Notification::from_message(&payload) else {
                    warn!(channel = %channel, payload = %payload, "unknown notification");
                    continue;
                };
                if tx.send(notification).is_err() {
                    break;
                }
            }
            trace!(channel = %channel, "notification listener stopped");
        });

        Ok(Subscription::new(topic, rx, move || listener.abort()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redis::build_pool;
    use crate::redis::fake::FakeRedis;
    use std::time::Duration;

    async fn bus_on(server: &FakeRedis) -> RedisBus {
        let config = RedisConfig::new(server.url());
        let pool = build_pool(&config).await.unwrap();
        RedisBus::from_pool(pool, config).unwrap()
    }

    async fn wait_for_subscribers(server: &FakeRedis, channel: &str, expected: usize) {
        for _ in 0..200 {
            if server.subscriber_count(channel) == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never had {} subscribers", channel, expected);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let server = FakeRedis::start().await;
        let bus = bus_on(&server).await;

        let mut first = bus.subscribe("p1").await.unwrap();
        let mut second = bus.subscribe("p1").await.unwrap();
        let mut other = bus.subscribe("p2").await.unwrap();

        let delivered = bus.publish("p1", Notification::Ready).await.unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(first.recv().await.unwrap(), Notification::Ready);
        assert_eq!(second.recv().await.unwrap(), Notification::Ready);

        bus.publish("p2", Notification::Failed("down".to_string()))
            .await
            .unwrap();
        assert_eq!(
            other.recv().await.unwrap(),
            Notification::Failed("down".to_string())
        );
    }

    #[tokio::test]
    async fn test_dropped_subscription_unsubscribes() {
        let server = FakeRedis::start().await;
        let bus = bus_on(&server).await;
        let channel = RedisConfig::new(server.url()).channel("p1");

        let subscription = bus.subscribe("p1").await.unwrap();
        assert_eq!(server.subscriber_count(&channel), 1);

        drop(subscription);
        wait_for_subscribers(&server, &channel, 0).await;
        assert_eq!(bus.publish("p1", Notification::Ready).await.unwrap(), 0);
    }
}
