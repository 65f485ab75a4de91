//! Server-side fan-out of like events.
//!
//! Every feed source (Redis subscriber, PostgreSQL change feed, local
//! notifier) pushes into one broadcast channel. Each stream connection holds
//! its own receiver. A receiver that falls behind skips what it missed; the
//! client's next resync covers the gap.
//!
//! Streams also end on [`LikeHub::shutdown`], so a draining server is not
//! held open by its subscribers.

use std::sync::Arc;

use futures::stream::{self, Stream};
use gallery_core::{LikeEvent, UserName};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;

/// Default channel capacity
pub const DEFAULT_HUB_CAPACITY: usize = 1024;

/// Broadcast hub for like events
#[derive(Clone)]
pub struct LikeHub {
    sender: broadcast::Sender<LikeEvent>,
    closing: Arc<watch::Sender<bool>>,
}

impl LikeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let (closing, _) = watch::channel(false);
        Self {
            sender,
            closing: Arc::new(closing),
        }
    }

    /// Sender handed to feed sources
    pub fn sender(&self) -> broadcast::Sender<LikeEvent> {
        self.sender.clone()
    }

    /// Push one event to every current subscriber. Returns how many received it.
    pub fn publish(&self, event: LikeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Raw receiver, including the caller's own events
    pub fn subscribe(&self) -> broadcast::Receiver<LikeEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// End every open stream, including ones subscribed later
    pub fn shutdown(&self) {
        self.closing.send_replace(true);
        tracing::info!(
            receivers = self.sender.receiver_count(),
            "Closing like streams"
        );
    }

    pub fn is_shut_down(&self) -> bool {
        *self.closing.borrow()
    }

    /// Stream of events not originated by `viewer`.
    ///
    /// Lagged receivers skip ahead. The stream ends once every sender is gone
    /// or the hub shuts down.
    pub fn subscribe_excluding(
        &self,
        viewer: Option<UserName>,
    ) -> impl Stream<Item = LikeEvent> + Send + 'static {
        let receiver = self.sender.subscribe();
        let closing = self.closing.subscribe();
        stream::unfold(
            (receiver, closing, viewer),
            |(mut receiver, mut closing, viewer)| async move {
                loop {
                    let received = tokio::select! {
                        biased;
                        () = closed(&mut closing) => return None,
                        received = receiver.recv() => received,
                    };
                    match received {
                        Ok(event) => {
                            if viewer.as_ref().is_some_and(|v| event.originated_by(v)) {
                                continue;
                            }
                            return Some((event, (receiver, closing, viewer)));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Like stream subscriber lagged, events dropped");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            },
        )
    }
}

/// Resolves once the hub is shut down or gone
async fn closed(closing: &mut watch::Receiver<bool>) {
    let _ = closing.wait_for(|closed| *closed).await;
}

impl Default for LikeHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

impl std::fmt::Debug for LikeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikeHub")
            .field("receivers", &self.sender.receiver_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
