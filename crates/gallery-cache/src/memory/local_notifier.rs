//! In-process change notifier.

use async_trait::async_trait;
use gallery_core::{ChangeNotifier, LikeEvent, RepoResult};
use tokio::sync::broadcast;

/// Publishes like events straight into the local fan-out channel
#[derive(Debug, Clone)]
pub struct LocalNotifier {
    sink: broadcast::Sender<LikeEvent>,
}

impl LocalNotifier {
    #[must_use]
    pub fn new(sink: broadcast::Sender<LikeEvent>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl ChangeNotifier for LocalNotifier {
    async fn publish(&self, event: &LikeEvent) -> RepoResult<()> {
        // Err only means nobody is listening right now
        let receivers = self.sink.send(event.clone()).unwrap_or(0);
        tracing::debug!(image_id = %event.image_id, receivers, "Published like event locally");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
