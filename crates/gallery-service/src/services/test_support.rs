//! Shared fixtures for service unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gallery_cache::{LocalNotifier, MemoryLikeRepository};
use gallery_core::{
    DomainError, Image, ImageCatalog, ImageId, ImagePage, ImageUpload, LikeRecord,
    LikeRepository, LikeStatus, PageInfo, RepoResult, UserName,
};
use parking_lot::Mutex;

use super::context::ServiceContext;
use super::hub::LikeHub;

/// Context backed by the in-memory store and a stub catalog
pub fn context() -> ServiceContext {
    context_with(Arc::new(MemoryLikeRepository::new()))
}

pub fn context_with(likes: Arc<dyn LikeRepository>) -> ServiceContext {
    context_with_catalog(likes, Arc::new(StubCatalog::with_images(8)))
}

pub fn context_with_catalog(
    likes: Arc<dyn LikeRepository>,
    catalog: Arc<dyn ImageCatalog>,
) -> ServiceContext {
    let hub = LikeHub::new(64);
    ServiceContext::builder()
        .likes(likes)
        .notifier(Arc::new(LocalNotifier::new(hub.sender())))
        .catalog(catalog)
        .hub(hub)
        .build()
        .unwrap()
}

pub fn image(id: &str) -> Image {
    Image {
        id: ImageId::new(id).unwrap(),
        description: format!("{id} description"),
        uploaded_by: "tester".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        original_url: format!("https://cdn.test/{id}/original.jpg"),
        gallery_url: format!("https://cdn.test/{id}/gallery.jpg"),
        thumbnail_url: format!("https://cdn.test/{id}/thumb.jpg"),
    }
}

/// Like store whose backend is always down
pub struct FailingStore;

impl FailingStore {
    fn down<T>() -> RepoResult<T> {
        Err(DomainError::StoreUnavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl LikeRepository for FailingStore {
    async fn toggle(&self, _: &ImageId, _: &UserName) -> RepoResult<LikeStatus> {
        Self::down()
    }

    async fn status(&self, _: &ImageId, _: &UserName) -> RepoResult<LikeStatus> {
        Self::down()
    }

    async fn batch_status(
        &self,
        _: &[ImageId],
        _: &UserName,
    ) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        Self::down()
    }

    async fn batch_counts(&self, _: &[ImageId]) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        Self::down()
    }

    async fn likes(&self, _: &ImageId) -> RepoResult<Vec<LikeRecord>> {
        Self::down()
    }

    async fn delete_image(&self, _: &ImageId) -> RepoResult<u64> {
        Self::down()
    }

    async fn ping(&self) -> RepoResult<()> {
        Self::down()
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// In-memory store that counts how often it is reached
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryLikeRepository,
    calls: AtomicUsize,
    record_loads: AtomicUsize,
}

impl CountingStore {
    /// Store calls of any kind
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that loaded an image's full like list
    pub fn record_loads(&self) -> usize {
        self.record_loads.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LikeRepository for CountingStore {
    async fn toggle(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus> {
        self.hit();
        self.inner.toggle(image_id, user_name).await
    }

    async fn status(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus> {
        self.hit();
        self.inner.status(image_id, user_name).await
    }

    async fn batch_status(
        &self,
        image_ids: &[ImageId],
        user_name: &UserName,
    ) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        self.hit();
        self.inner.batch_status(image_ids, user_name).await
    }

    async fn batch_counts(&self, image_ids: &[ImageId]) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        self.hit();
        self.inner.batch_counts(image_ids).await
    }

    async fn likes(&self, image_id: &ImageId) -> RepoResult<Vec<LikeRecord>> {
        self.hit();
        self.record_loads.fetch_add(1, Ordering::SeqCst);
        self.inner.likes(image_id).await
    }

    async fn delete_image(&self, image_id: &ImageId) -> RepoResult<u64> {
        self.hit();
        self.inner.delete_image(image_id).await
    }

    async fn ping(&self) -> RepoResult<()> {
        self.inner.ping().await
    }

    fn backend(&self) -> &'static str {
        "counting"
    }
}

/// In-process image catalog, newest first
#[derive(Default)]
pub struct StubCatalog {
    images: Mutex<Vec<Image>>,
    pub uploads: Mutex<Vec<ImageUpload>>,
}

impl StubCatalog {
    pub fn with_images(count: usize) -> Self {
        let images = (0..count).rev().map(|i| image(&format!("img{i}"))).collect();
        Self {
            images: Mutex::new(images),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ImageCatalog for StubCatalog {
    async fn list(&self, page: u32, limit: u32) -> RepoResult<ImagePage> {
        let images = self.images.lock();
        let total = images.len();
        let start = ((page - 1) * limit) as usize;
        let slice: Vec<Image> = images.iter().skip(start).take(limit as usize).cloned().collect();
        let total_pages = total.div_ceil(limit as usize) as u32;

        Ok(ImagePage {
            images: slice,
            pagination: PageInfo {
                current_page: page,
                total_pages,
                total_items: total as u64,
                has_more: page < total_pages,
                items_per_page: limit,
            },
        })
    }

    async fn upload(&self, upload: ImageUpload) -> RepoResult<serde_json::Value> {
        let id = format!("upload{}", self.uploads.lock().len());
        let body = serde_json::json!({
            "id": id,
            "description": upload.metadata.description,
            "uploaded_by": upload.metadata.uploaded_by,
        });
        self.uploads.lock().push(upload);
        Ok(body)
    }

    async fn delete(&self, image_id: &ImageId) -> RepoResult<()> {
        let mut images = self.images.lock();
        let before = images.len();
        images.retain(|i| &i.id != image_id);
        if images.len() == before {
            return Err(DomainError::ImageNotFound(image_id.clone()));
        }
        Ok(())
    }
}
