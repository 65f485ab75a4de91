//! Event stream whose payloads are applied directly

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use gallery_core::{ImageId, LikeEvent};
use tracing::{debug, warn};

use super::strategy::{fetch_statuses, Change, EventDeduper, SyncStrategy, SyncUpdate};
use crate::cache::TicketClock;
use crate::config::StrategyKind;
use crate::error::{ClientError, ClientResult};
use crate::http::{LikeEventStream, LikesClient};

/// Shared stream handling for the push and subscribe strategies
pub(crate) struct EventFeed {
    client: LikesClient,
    stream: Option<LikeEventStream>,
    deduper: EventDeduper,
    idle_wait: Duration,
}

impl EventFeed {
    pub(crate) fn new(client: LikesClient, idle_wait: Duration) -> Self {
        Self {
            client,
            stream: None,
            deduper: EventDeduper::new(256),
            idle_wait,
        }
    }

    pub(crate) fn client(&self) -> &LikesClient {
        &self.client
    }

    pub(crate) fn idle_wait(&self) -> Duration {
        self.idle_wait
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub(crate) async fn connect(&mut self) -> ClientResult<()> {
        if self.stream.is_none() {
            self.stream = Some(self.client.open_stream().await?);
        }
        Ok(())
    }

    pub(crate) fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            debug!("Like stream closed");
        }
    }

    /// Next fresh event about a visible image.
    ///
    /// `Ok(None)` when the stream stayed quiet for the idle wait or delivered
    /// something irrelevant. Never reconnects: events missed while the stream
    /// was down are only recovered by a resync, which opens it again.
    pub(crate) async fn next_event(
        &mut self,
        visible: &[ImageId],
    ) -> ClientResult<Option<LikeEvent>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ClientError::StreamClosed);
        };

        let next = match tokio::time::timeout(self.idle_wait, stream.next()).await {
            Ok(next) => next,
            Err(_) => return Ok(None),
        };

        match next {
            Some(Ok(event)) => {
                if !visible.contains(&event.image_id) || !self.deduper.first_sighting(&event) {
                    return Ok(None);
                }
                Ok(Some(event))
            }
            Some(Err(ClientError::Decode(e))) => {
                warn!(error = %e, "Skipping malformed event");
                Ok(None)
            }
            Some(Err(e)) => {
                self.stream = None;
                Err(e)
            }
            None => {
                self.stream = None;
                Err(ClientError::StreamClosed)
            }
        }
    }
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("connected", &self.stream.is_some())
            .field("idle_wait", &self.idle_wait)
            .finish()
    }
}

/// Applies each event's count as it arrives
#[derive(Debug)]
pub struct PushStrategy {
    feed: EventFeed,
    clock: TicketClock,
}

impl PushStrategy {
    pub fn new(client: LikesClient, clock: TicketClock, idle_wait: Duration) -> Self {
        Self {
            feed: EventFeed::new(client, idle_wait),
            clock,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.feed.is_connected()
    }
}

#[async_trait]
impl SyncStrategy for PushStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Push
    }

    fn cadence(&self) -> Duration {
        self.feed.idle_wait()
    }

    async fn resync(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>> {
        // Subscribe first so nothing between the fetch and the subscription is lost
        self.feed.connect().await?;
        fetch_statuses(self.feed.client(), &self.clock, visible).await
    }

    async fn next_updates(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>> {
        let Some(event) = self.feed.next_event(visible).await? else {
            return Ok(Vec::new());
        };

        let update = SyncUpdate {
            image_id: event.image_id.clone(),
            change: Change::Count(event.count),
            ticket: self.clock.issue(),
            remote: Some(event.kind),
        };
        Ok(vec![update])
    }

    async fn suspend(&mut self) {
        self.feed.disconnect();
    }
}
