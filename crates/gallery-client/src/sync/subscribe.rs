//! Event stream used as a change signal, each followed by a targeted fetch

use std::time::Duration;

use async_trait::async_trait;
use gallery_core::ImageId;

use super::push::EventFeed;
use super::strategy::{fetch_statuses, SyncStrategy, SyncUpdate};
use crate::cache::TicketClock;
use crate::config::StrategyKind;
use crate::error::ClientResult;
use crate::http::LikesClient;

/// Refetches the one image named by each relevant event
#[derive(Debug)]
pub struct SubscribeStrategy {
    feed: EventFeed,
    clock: TicketClock,
}

impl SubscribeStrategy {
    pub fn new(client: LikesClient, clock: TicketClock, idle_wait: Duration) -> Self {
        Self {
            feed: EventFeed::new(client, idle_wait),
            clock,
        }
    }
}

#[async_trait]
impl SyncStrategy for SubscribeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Subscribe
    }

    fn cadence(&self) -> Duration {
        self.feed.idle_wait()
    }

    async fn resync(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>> {
        self.feed.connect().await?;
        fetch_statuses(self.feed.client(), &self.clock, visible).await
    }

    async fn next_updates(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>> {
        let Some(event) = self.feed.next_event(visible).await? else {
            return Ok(Vec::new());
        };

        let updates = fetch_statuses(
            self.feed.client(),
            &self.clock,
            std::slice::from_ref(&event.image_id),
        )
        .await?;
        Ok(updates
            .into_iter()
            .map(|update| update.triggered_by(event.kind))
            .collect())
    }

    async fn suspend(&mut self) {
        self.feed.disconnect();
    }
}
