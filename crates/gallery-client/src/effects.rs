//! Effects the runtime asks the UI to render

use gallery_core::{ImageId, LikeStatus};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// A change the UI should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Re-render the heart and count of one image
    Updated { image_id: ImageId, status: LikeStatus },
    /// Play the confetti burst on one image
    Celebrate { image_id: ImageId },
    /// A toggle was rolled back
    ToggleFailed { image_id: ImageId, message: String },
}

/// Non-blocking sender of UI effects
#[derive(Debug, Clone)]
pub struct EffectSink {
    sender: mpsc::Sender<UiEffect>,
}

impl EffectSink {
    pub fn new(sender: mpsc::Sender<UiEffect>) -> Self {
        Self { sender }
    }

    /// Create a sink and the receiver the UI drains
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<UiEffect>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self::new(sender), receiver)
    }

    /// Send without waiting. A full or closed channel drops the effect.
    pub fn emit(&self, effect: UiEffect) {
        match self.sender.try_send(effect) {
            Ok(()) => {}
            Err(TrySendError::Full(effect)) => warn!(?effect, "UI effect dropped, channel full"),
            Err(TrySendError::Closed(_)) => debug!("UI effect receiver gone"),
        }
    }

    pub fn updated(&self, image_id: &ImageId, status: LikeStatus) {
        self.emit(UiEffect::Updated {
            image_id: image_id.clone(),
            status,
        });
    }

    pub fn celebrate(&self, image_id: &ImageId) {
        self.emit(UiEffect::Celebrate {
            image_id: image_id.clone(),
        });
    }
}
