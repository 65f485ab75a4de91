//! One client session: cache, controller and sync driver wired together

use std::collections::HashMap;
use std::sync::Arc;

use gallery_core::{ImageId, LikeStatus};
use tokio::sync::mpsc;
use tracing::info;

use crate::cache::LikeCache;
use crate::config::ClientConfig;
use crate::controller::LikeController;
use crate::effects::{EffectSink, UiEffect};
use crate::error::ClientResult;
use crate::http::LikesClient;
use crate::sync::{build_strategy, SyncDriver, SyncHandle};

/// A running like-sync session
#[derive(Debug)]
pub struct LikeSync {
    config: ClientConfig,
    cache: Arc<LikeCache>,
    controller: LikeController,
    driver: SyncHandle,
}

impl LikeSync {
    /// Start syncing `visible`. Returns the session and the UI effect receiver.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        config: ClientConfig,
        visible: Vec<ImageId>,
    ) -> ClientResult<(Self, mpsc::Receiver<UiEffect>)> {
        let client = LikesClient::new(&config)?;
        let cache = Arc::new(LikeCache::new());
        let (effects, receiver) = EffectSink::channel(config.effect_buffer);

        let strategy = build_strategy(&config, client.clone(), cache.clock().clone());
        let driver = SyncDriver::new(strategy, cache.clone(), effects.clone(), &config)
            .with_visible(visible)
            .spawn();
        let controller = LikeController::new(client, cache.clone(), effects);

        info!(
            base_url = %config.base_url,
            strategy = %config.strategy,
            user = config.user_name.as_ref().map(gallery_core::UserName::as_str),
            "Like sync started"
        );

        Ok((
            Self {
                config,
                cache,
                controller,
                driver,
            },
            receiver,
        ))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Optimistically toggle the session user's like
    pub async fn toggle(&self, image_id: &ImageId) -> ClientResult<LikeStatus> {
        self.controller.toggle(image_id).await
    }

    /// Status to render for one image
    pub fn status(&self, image_id: &ImageId) -> LikeStatus {
        self.cache.display(image_id)
    }

    pub fn statuses(&self, image_ids: &[ImageId]) -> HashMap<ImageId, LikeStatus> {
        self.cache.snapshot(image_ids)
    }

    /// Replace the images on screen; they are resynced on the next cycle
    pub async fn show_images(&self, image_ids: Vec<ImageId>) -> ClientResult<()> {
        self.driver.show_images(image_ids).await
    }

    /// Pause syncing while the page is hidden, resync when it returns
    pub async fn set_page_visible(&self, visible: bool) -> ClientResult<()> {
        self.driver.set_page_visible(visible).await
    }

    pub async fn resync(&self) -> ClientResult<()> {
        self.driver.resync().await
    }

    pub async fn shutdown(self) {
        self.driver.shutdown().await;
        info!("Like sync stopped");
    }
}
