//! The strategy seam between the sync driver and the network.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use gallery_core::{ChangeKind, ImageId, LikeEvent, LikeStatus, UserName};

use crate::cache::{Ticket, TicketClock};
use crate::config::StrategyKind;
use crate::error::ClientResult;
use crate::http::LikesClient;

/// What an update changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Full status from the viewer's point of view
    Status(LikeStatus),
    /// Count only; the viewer's own flag is unchanged
    Count(u64),
}

/// One update for the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUpdate {
    pub image_id: ImageId,
    pub change: Change,
    pub ticket: Ticket,
    /// Set when the update was triggered by another user's change
    pub remote: Option<ChangeKind>,
}

impl SyncUpdate {
    pub fn status(image_id: ImageId, status: LikeStatus, ticket: Ticket) -> Self {
        Self {
            image_id,
            change: Change::Status(status),
            ticket,
            remote: None,
        }
    }

    #[must_use]
    pub fn triggered_by(mut self, kind: ChangeKind) -> Self {
        self.remote = Some(kind);
        self
    }

    /// Whether this update announces someone else's new like
    pub fn is_remote_like(&self) -> bool {
        self.remote == Some(ChangeKind::Insert)
    }
}

/// A way of keeping the cache in step with the server
#[async_trait]
pub trait SyncStrategy: Send {
    fn kind(&self) -> StrategyKind;

    /// How long [`SyncStrategy::next_updates`] may wait before it issues a request
    fn cadence(&self) -> Duration {
        Duration::ZERO
    }

    /// Fetch the current status of every visible image
    async fn resync(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>>;

    /// Wait for the next batch of changes to the visible images
    async fn next_updates(&mut self, visible: &[ImageId]) -> ClientResult<Vec<SyncUpdate>>;

    /// Release held connections while the page is hidden
    async fn suspend(&mut self);
}

/// Batch-fetch `visible`, stamping every result with one ticket taken up front
pub(crate) async fn fetch_statuses(
    client: &LikesClient,
    clock: &TicketClock,
    visible: &[ImageId],
) -> ClientResult<Vec<SyncUpdate>> {
    if visible.is_empty() {
        return Ok(Vec::new());
    }
    let ticket = clock.issue();
    let mut statuses = client.batch_status(visible).await?;

    Ok(visible
        .iter()
        .map(|id| {
            let status = statuses.remove(id).unwrap_or_default();
            SyncUpdate::status(id.clone(), status, ticket)
        })
        .collect())
}

/// Identity of one store change
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EventKey {
    image_id: ImageId,
    user_name: UserName,
    kind: ChangeKind,
    at_micros: i64,
}

impl EventKey {
    fn of(event: &LikeEvent) -> Self {
        Self {
            image_id: event.image_id.clone(),
            user_name: event.user_name.clone(),
            kind: event.kind,
            at_micros: event.timestamp.timestamp_micros(),
        }
    }
}

/// Remembers recently seen events so redelivered ones are ignored
#[derive(Debug)]
pub(crate) struct EventDeduper {
    seen: HashSet<EventKey>,
    order: VecDeque<EventKey>,
    capacity: usize,
}

impl EventDeduper {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Returns true the first time an event is seen
    pub(crate) fn first_sighting(&mut self, event: &LikeEvent) -> bool {
        let key = EventKey::of(event);
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }
}
