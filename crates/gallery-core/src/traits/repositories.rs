//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (Redis, PostgreSQL, or in-memory).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::entities::{ImagePage, ImageUpload, LikeRecord, LikeStatus};
use crate::error::DomainError;
use crate::events::LikeEvent;
use crate::value_objects::{ImageId, UserName};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Like Repository
// ============================================================================

/// Durable like store.
///
/// Every mutation is atomic per `(image_id, user_name)`. Failures to reach the
/// backing store surface as retryable errors and never as partial success.
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Like if absent, unlike if present. Returns the resulting status.
    async fn toggle(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus>;

    /// Point-in-time status of one image for one viewer
    async fn status(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus>;

    /// Status of many images in a single round trip.
    ///
    /// The result holds an entry for every requested id. Unknown ids map to
    /// `LikeStatus::empty()`.
    async fn batch_status(
        &self,
        image_ids: &[ImageId],
        user_name: &UserName,
    ) -> RepoResult<HashMap<ImageId, LikeStatus>>;

    /// Like counts of many images in a single round trip, for a viewer
    /// without a name. `liked` is always false; every requested id is present.
    async fn batch_counts(&self, image_ids: &[ImageId]) -> RepoResult<HashMap<ImageId, LikeStatus>>;

    /// All like records of one image, oldest first
    async fn likes(&self, image_id: &ImageId) -> RepoResult<Vec<LikeRecord>>;

    /// Remove every like of an image. Returns the number removed.
    async fn delete_image(&self, image_id: &ImageId) -> RepoResult<u64>;

    /// Check the backing store is reachable
    async fn ping(&self) -> RepoResult<()>;

    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;
}

// ============================================================================
// Change Notifier
// ============================================================================

/// Publishes like changes to every interested server instance
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Publish one change. Delivery is at-most-once.
    async fn publish(&self, event: &LikeEvent) -> RepoResult<()>;

    /// Notifier name for logs
    fn name(&self) -> &'static str;
}

// ============================================================================
// Image Catalog
// ============================================================================

/// External image service
#[async_trait]
pub trait ImageCatalog: Send + Sync {
    /// One page of images, newest first
    async fn list(&self, page: u32, limit: u32) -> RepoResult<ImagePage>;

    /// Upload an image. Returns the service's response body untouched.
    async fn upload(&self, upload: ImageUpload) -> RepoResult<serde_json::Value>;

    /// Delete an image
    async fn delete(&self, image_id: &ImageId) -> RepoResult<()>;
}

/// Fill in `LikeStatus::empty()` for every id missing from `found`
pub fn complete_batch(
    image_ids: &[ImageId],
    mut found: HashMap<ImageId, LikeStatus>,
) -> HashMap<ImageId, LikeStatus> {
    for id in image_ids {
        found.entry(id.clone()).or_insert_with(LikeStatus::empty);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_batch_fills_missing() {
        let a = ImageId::new("a").unwrap();
        let b = ImageId::new("b").unwrap();

        let mut found = HashMap::new();
        found.insert(a.clone(), LikeStatus::new(true, 2));

        let result = complete_batch(&[a.clone(), b.clone()], found);
        assert_eq!(result.len(), 2);
        assert_eq!(result[&a], LikeStatus::new(true, 2));
        assert_eq!(result[&b], LikeStatus::empty());
    }

    #[test]
    fn test_complete_batch_empty() {
        assert!(complete_batch(&[], HashMap::new()).is_empty());
    }
}
