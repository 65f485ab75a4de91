//! Application state
//!
//! Holds the shared state for the Axum application including
//! the service context, configuration and the feed tasks feeding the hub.

use std::sync::Arc;

use gallery_cache::Subscriber;
use gallery_common::AppConfig;
use gallery_service::{LikeHub, ServiceContext};
use tokio::task::JoinHandle;

/// Background work that must live as long as the server
#[derive(Default)]
pub struct FeedTasks {
    handles: Vec<JoinHandle<()>>,
    subscriber: Option<Subscriber>,
}

impl FeedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_task(mut self, handle: JoinHandle<()>) -> Self {
        self.handles.push(handle);
        self
    }

    /// Keep the Redis subscriber alive; dropping it stops the listener
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: Subscriber) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for FeedTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Service context containing all dependencies
    service_context: Arc<ServiceContext>,
    /// Application configuration
    config: Arc<AppConfig>,
    feeds: Arc<FeedTasks>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service_context: ServiceContext, config: AppConfig, feeds: FeedTasks) -> Self {
        Self {
            service_context: Arc::new(service_context),
            config: Arc::new(config),
            feeds: Arc::new(feeds),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the like event hub
    pub fn hub(&self) -> &LikeHub {
        self.service_context.hub()
    }

    /// Number of running feed tasks
    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &self.service_context)
            .field("config", &"AppConfig")
            .field("feeds", &self.feeds.len())
            .finish()
    }
}
