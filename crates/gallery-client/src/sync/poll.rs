//! Periodic batch polling

use std::time::Duration;

use async_trait::async_trait;
use gallery_core::ImageId;
use tracing::debug;

use super::strategy::{fetch_statuses, SyncStrategy, SyncUpdate};
use crate::cache::TicketClock;
use crate::config::StrategyKind;
use crate::error::ClientResult;
use crate::http::LikesClient;

/// Batch-fetches the visible images every interval
#[derive(Debug)]
pub struct PollStrategy {
    client: LikesClient,
    clock: TicketClock,
    interval: Duration,
}

impl PollStrategy {
    pub fn new(client: LikesClient, clock: TicketClock, interval: Duration) -> Self {
        Self {
            client,
            clock,
            interval,
        }
    }
}

#[async_trait]
impl SyncStrategy for PollStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Poll
    }

    fn cadence(&self) -> Duration {
        self.interval
    }

    async fn resync(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>> {
        fetch_statuses(&self.client, &self.clock, visible).await
    }

    async fn next_updates(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>> {
        tokio::time::sleep(self.interval).await;
        let updates = fetch_statuses(&self.client, &self.clock, visible).await?;
        debug!(images = updates.len(), "Poll completed");
        Ok(updates)
    }

    async fn suspend(&mut self) {}
}
