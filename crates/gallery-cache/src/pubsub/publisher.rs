//! Redis Pub/Sub publisher.
//!
//! Publishes like events so every server instance can push them to its
//! stream subscribers.

use async_trait::async_trait;
use gallery_core::{ChangeNotifier, LikeEvent, RepoResult};
use redis::AsyncCommands;

use crate::likes::map_redis_error;
use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
    channel: PubSubChannel,
}

impl Publisher {
    /// Create a publisher on the default like channel
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self::with_channel(pool, PubSubChannel::likes())
    }

    /// Create a publisher on a specific channel
    #[must_use]
    pub fn with_channel(pool: RedisPool, channel: PubSubChannel) -> Self {
        Self { pool, channel }
    }

    /// Channel events are published on
    #[must_use]
    pub fn channel(&self) -> &PubSubChannel {
        &self.channel
    }

    /// Publish a like event. Returns the number of receivers.
    pub async fn publish_event(&self, event: &LikeEvent) -> RedisResult<u32> {
        let payload = serde_json::to_string(event)?;
        let receivers = self.publish_raw(&payload).await?;

        tracing::debug!(
            channel = %self.channel,
            image_id = %event.image_id,
            kind = event.kind.as_str(),
            receivers = receivers,
            "Published like event"
        );

        Ok(receivers)
    }

    /// Publish a raw message
    pub async fn publish_raw(&self, message: &str) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let receivers: u32 = conn.publish(self.channel.name(), message).await?;
        Ok(receivers)
    }
}

#[async_trait]
impl ChangeNotifier for Publisher {
    async fn publish(&self, event: &LikeEvent) -> RepoResult<()> {
        self.publish_event(event)
            .await
            .map(|_| ())
            .map_err(map_redis_error)
    }

    fn name(&self) -> &'static str {
        "redis-pubsub"
    }
}
