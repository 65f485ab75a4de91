//! Optimistic like toggles.
//!
//! The heart flips at once; the server's answer then confirms it, or the
//! previous state comes back if the request fails.

use std::sync::Arc;

use gallery_core::{ImageId, LikeStatus};
use tracing::{info, instrument, warn};

use crate::cache::LikeCache;
use crate::effects::{EffectSink, UiEffect};
use crate::error::{ClientError, ClientResult};
use crate::http::LikesClient;

#[derive(Debug, Clone)]
pub struct LikeController {
    client: LikesClient,
    cache: Arc<LikeCache>,
    effects: EffectSink,
}

impl LikeController {
    pub fn new(client: LikesClient, cache: Arc<LikeCache>, effects: EffectSink) -> Self {
        Self {
            client,
            cache,
            effects,
        }
    }

    /// Toggle the session user's like on one image.
    ///
    /// Refused locally without a user name, or while a toggle for the same
    /// image is in flight. A failed request reverts the local change.
    #[instrument(skip(self))]
    pub async fn toggle(&self, image_id: &ImageId) -> ClientResult<LikeStatus> {
        if self.client.user_name().is_none() {
            return Err(ClientError::MissingUserName);
        }

        let new_liked = !self.cache.display(image_id).liked;
        let optimistic = self
            .cache
            .apply_optimistic(image_id, new_liked)
            .ok_or_else(|| ClientError::TogglePending(image_id.clone()))?;
        self.effects.updated(image_id, optimistic.shown);

        match self.client.toggle(image_id).await {
            Ok(status) => {
                self.cache.confirm(image_id, status);
                if status != optimistic.shown {
                    self.effects.updated(image_id, status);
                }
                if status.liked {
                    self.effects.celebrate(image_id);
                }
                info!(liked = status.liked, count = status.count, "Like toggled");
                Ok(status)
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "Toggle failed, reverting");
                self.cache.revert(image_id, optimistic.prior);
                self.effects.updated(image_id, optimistic.prior);
                self.effects.emit(UiEffect::ToggleFailed {
                    image_id: image_id.clone(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}
