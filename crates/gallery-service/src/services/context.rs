//! Service context - dependency container for services
//!
//! Holds the like store, the change notifier, the image catalog and the
//! server-side fan-out hub.

use std::sync::Arc;

use gallery_core::traits::{ChangeNotifier, ImageCatalog, LikeRepository};

use super::error::{ServiceError, ServiceResult};
use super::hub::LikeHub;

/// Request limits enforced by the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLimits {
    /// Maximum number of ids in one batch status request
    pub max_batch_ids: usize,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Page size used when the caller does not pass one
    pub default_page_limit: u32,
    /// Largest page size forwarded to the image service
    pub max_page_limit: u32,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            max_batch_ids: 100,
            max_upload_bytes: 10 * 1024 * 1024,
            default_page_limit: 6,
            max_page_limit: 50,
        }
    }
}

/// Service context containing all dependencies
///
/// Cheap to clone; every dependency sits behind an `Arc`.
#[derive(Clone)]
pub struct ServiceContext {
    likes: Arc<dyn LikeRepository>,
    notifier: Arc<dyn ChangeNotifier>,
    catalog: Arc<dyn ImageCatalog>,
    hub: LikeHub,
    limits: ServiceLimits,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        likes: Arc<dyn LikeRepository>,
        notifier: Arc<dyn ChangeNotifier>,
        catalog: Arc<dyn ImageCatalog>,
        hub: LikeHub,
        limits: ServiceLimits,
    ) -> Self {
        Self {
            likes,
            notifier,
            catalog,
            hub,
            limits,
        }
    }

    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Get the like store
    pub fn likes(&self) -> &dyn LikeRepository {
        self.likes.as_ref()
    }

    /// Get the change notifier
    pub fn notifier(&self) -> &dyn ChangeNotifier {
        self.notifier.as_ref()
    }

    /// Get the image catalog
    pub fn catalog(&self) -> &dyn ImageCatalog {
        self.catalog.as_ref()
    }

    /// Get the fan-out hub
    pub fn hub(&self) -> &LikeHub {
        &self.hub
    }

    pub fn limits(&self) -> &ServiceLimits {
        &self.limits
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("likes", &self.likes.backend())
            .field("notifier", &self.notifier.name())
            .field("hub", &self.hub)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    likes: Option<Arc<dyn LikeRepository>>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    catalog: Option<Arc<dyn ImageCatalog>>,
    hub: Option<LikeHub>,
    limits: ServiceLimits,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn likes(mut self, repo: Arc<dyn LikeRepository>) -> Self {
        self.likes = Some(repo);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn ImageCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn hub(mut self, hub: LikeHub) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn limits(mut self, limits: ServiceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.limits.max_upload_bytes = bytes;
        self
    }

    /// Build the ServiceContext
    ///
    /// A hub with the default capacity is created when none was given.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.likes
                .ok_or_else(|| ServiceError::validation("like repository is required"))?,
            self.notifier
                .ok_or_else(|| ServiceError::validation("change notifier is required"))?,
            self.catalog
                .ok_or_else(|| ServiceError::validation("image catalog is required"))?,
            self.hub.unwrap_or_default(),
            self.limits,
        ))
    }
}
