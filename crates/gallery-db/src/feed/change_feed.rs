//! PostgreSQL change feed.
//!
//! The `likes` table trigger announces every insert and delete with
//! `pg_notify`. This listener decodes those notifications and forwards them to
//! the local fan-out. Delivery is at-most-once: notifications sent while the
//! listener is reconnecting are lost and clients recover through resync.

use std::time::Duration;

use async_trait::async_trait;
use gallery_core::{ChangeNotifier, LikeEvent, RepoResult};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Channel the trigger notifies on
pub const CHANGE_CHANNEL: &str = "like_changes";

/// Listener turning table notifications into like events
#[derive(Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
    channel: String,
    reconnect_delay: Duration,
}

impl PgChangeFeed {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            channel: CHANGE_CHANNEL.to_string(),
            reconnect_delay: Duration::from_secs(1),
        }
    }

    /// Set the delay between reconnect attempts
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Start forwarding events into `sink` on a background task
    pub fn spawn(self, sink: broadcast::Sender<LikeEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.listen(&sink).await {
                    Ok(()) => {
                        tracing::info!("Change feed stopped");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Change feed error, reconnecting...");
                        tokio::time::sleep(self.reconnect_delay).await;
                    }
                }
            }
        })
    }

    /// Listen until the connection fails. Returns Ok once `sink` has no
    /// receivers left and never will again.
    async fn listen(&self, sink: &broadcast::Sender<LikeEvent>) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;
        tracing::info!(channel = %self.channel, "Change feed listening");

        loop {
            let notification = listener.recv().await?;
            let Some(event) = decode(notification.payload()) else {
                continue;
            };

            tracing::trace!(
                image_id = %event.image_id,
                kind = event.kind.as_str(),
                "Change feed event"
            );

            if sink.send(event).is_err() && self.pool.is_closed() {
                return Ok(());
            }
        }
    }
}

/// Decode one notification payload
fn decode(payload: &str) -> Option<LikeEvent> {
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed change notification");
            None
        }
    }
}

/// Notifier for the PostgreSQL backend.
///
/// The table trigger already emits every change, so publishing is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseNotifier;

#[async_trait]
impl ChangeNotifier for DatabaseNotifier {
    async fn publish(&self, event: &LikeEvent) -> RepoResult<()> {
        tracing::trace!(image_id = %event.image_id, "Change emitted by database trigger");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres-trigger"
    }
}
