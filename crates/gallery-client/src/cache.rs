//! Local like cache reconciling optimistic toggles with server state.
//!
//! Each image keeps the last confirmed status, at most one pending
//! optimistic change, and the ticket of the newest update applied. Tickets
//! are taken when a fetch is issued, so a slow response can never overwrite
//! a fresher one that arrived first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gallery_core::{ImageId, LikeStatus};
use parking_lot::Mutex;
use tracing::debug;

/// Ordering token for updates; larger is newer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Shared monotonic ticket counter
#[derive(Debug, Clone, Default)]
pub struct TicketClock {
    last: Arc<AtomicU64>,
}

impl TicketClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// An optimistic change awaiting the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticToggle {
    /// Status before the change; restored on revert
    pub prior: LikeStatus,
    /// Status shown while the request is in flight
    pub shown: LikeStatus,
    pub ticket: Ticket,
}

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    confirmed: LikeStatus,
    pending: Option<OptimisticToggle>,
    applied: Ticket,
}

impl Entry {
    fn display(&self) -> LikeStatus {
        self.pending.map_or(self.confirmed, |p| p.shown)
    }

    fn accepts(&self, ticket: Ticket) -> bool {
        ticket >= self.applied
    }
}

/// Per-image like cache shared by the controller and the sync driver
#[derive(Debug, Default)]
pub struct LikeCache {
    entries: Mutex<HashMap<ImageId, Entry>>,
    clock: TicketClock,
}

impl LikeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> &TicketClock {
        &self.clock
    }

    /// Take a ticket for an update about to be fetched
    pub fn issue(&self) -> Ticket {
        self.clock.issue()
    }

    /// Status to render: the pending optimistic value if any, else the confirmed one
    pub fn display(&self, image_id: &ImageId) -> LikeStatus {
        self.entries
            .lock()
            .get(image_id)
            .map(Entry::display)
            .unwrap_or_default()
    }

    pub fn snapshot(&self, image_ids: &[ImageId]) -> HashMap<ImageId, LikeStatus> {
        let entries = self.entries.lock();
        image_ids
            .iter()
            .map(|id| {
                let status = entries.get(id).map(Entry::display).unwrap_or_default();
                (id.clone(), status)
            })
            .collect()
    }

    pub fn is_pending(&self, image_id: &ImageId) -> bool {
        self.entries
            .lock()
            .get(image_id)
            .is_some_and(|e| e.pending.is_some())
    }

    /// Apply a server-provided status. Returns false if the update was stale.
    pub fn apply_server(&self, image_id: &ImageId, status: LikeStatus, ticket: Ticket) -> bool {
        let mut entries = self.entries.lock();
        let entry = entries.entry(image_id.clone()).or_default();
        if !entry.accepts(ticket) {
            debug!(image_id = %image_id, ticket = ticket.value(), "Dropping stale update");
            return false;
        }
        entry.confirmed = status;
        entry.applied = ticket;
        true
    }

    /// Apply a count from another user's change, keeping our own liked flag
    pub fn apply_count(&self, image_id: &ImageId, count: u64, ticket: Ticket) -> bool {
        let liked = self
            .entries
            .lock()
            .get(image_id)
            .is_some_and(|e| e.confirmed.liked);
        self.apply_server(image_id, LikeStatus::new(liked, count), ticket)
    }

    /// Flip the local state by one like.
    ///
    /// Returns `None` while another toggle for the same image is pending.
    pub fn apply_optimistic(&self, image_id: &ImageId, new_liked: bool) -> Option<OptimisticToggle> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(image_id.clone()).or_default();
        if entry.pending.is_some() {
            return None;
        }

        let prior = entry.confirmed;
        let count = if new_liked {
            prior.count + 1
        } else {
            prior.count.saturating_sub(1)
        };
        let toggle = OptimisticToggle {
            prior,
            shown: LikeStatus::new(new_liked, count),
            ticket: self.clock.issue(),
        };
        entry.pending = Some(toggle);
        // Fetches issued before the toggle can't describe it
        entry.applied = toggle.ticket;
        Some(toggle)
    }

    /// Settle a pending toggle with the server's answer
    pub fn confirm(&self, image_id: &ImageId, status: LikeStatus) {
        let ticket = self.clock.issue();
        let mut entries = self.entries.lock();
        let entry = entries.entry(image_id.clone()).or_default();
        entry.confirmed = status;
        entry.pending = None;
        entry.applied = ticket;
    }

    /// Undo a pending toggle, restoring exactly what was shown before it
    pub fn revert(&self, image_id: &ImageId, prior: LikeStatus) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(image_id.clone()).or_default();
        entry.confirmed = prior;
        entry.pending = None;
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
