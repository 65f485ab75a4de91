//! In-process like store for development and tests.
//!
//! Each image's likers live behind one `DashMap` entry, so a toggle holds the
//! shard lock for the whole read-modify-write.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gallery_core::{ImageId, LikeRecord, LikeRepository, LikeStatus, RepoResult, UserName};
use tracing::instrument;

/// Like store held in memory
#[derive(Debug, Default)]
pub struct MemoryLikeRepository {
    likes: DashMap<ImageId, BTreeMap<UserName, DateTime<Utc>>>,
}

impl MemoryLikeRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of images with at least one like
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.likes.len()
    }

    fn status_of(&self, image_id: &ImageId, user_name: &UserName) -> LikeStatus {
        self.likes.get(image_id).map_or_else(LikeStatus::empty, |users| {
            LikeStatus::new(users.contains_key(user_name), users.len() as u64)
        })
    }
}

#[async_trait]
impl LikeRepository for MemoryLikeRepository {
    #[instrument(skip(self))]
    async fn toggle(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus> {
        let status = {
            let mut users = self.likes.entry(image_id.clone()).or_default();
            let liked = if users.remove(user_name).is_some() {
                false
            } else {
                users.insert(user_name.clone(), Utc::now());
                true
            };
            LikeStatus::new(liked, users.len() as u64)
        };

        // Drop empty images so the map only tracks liked ones
        if status.count == 0 {
            self.likes.remove_if(image_id, |_, users| users.is_empty());
        }

        tracing::info!(
            image_id = %image_id,
            user_name = %user_name,
            liked = status.liked,
            count = status.count,
            "Like toggled"
        );
        Ok(status)
    }

    async fn status(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus> {
        Ok(self.status_of(image_id, user_name))
    }

    #[instrument(skip(self, image_ids), fields(ids = image_ids.len()))]
    async fn batch_status(
        &self,
        image_ids: &[ImageId],
        user_name: &UserName,
    ) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        Ok(image_ids
            .iter()
            .map(|id| (id.clone(), self.status_of(id, user_name)))
            .collect())
    }

    #[instrument(skip(self, image_ids), fields(ids = image_ids.len()))]
    async fn batch_counts(&self, image_ids: &[ImageId]) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        Ok(image_ids
            .iter()
            .map(|id| {
                let count = self.likes.get(id).map_or(0, |users| users.len() as u64);
                (id.clone(), LikeStatus::new(false, count))
            })
            .collect())
    }

    async fn likes(&self, image_id: &ImageId) -> RepoResult<Vec<LikeRecord>> {
        let mut records: Vec<LikeRecord> = self
            .likes
            .get(image_id)
            .map(|users| {
                users
                    .iter()
                    .map(|(user_name, created_at)| LikeRecord {
                        image_id: image_id.clone(),
                        user_name: user_name.clone(),
                        created_at: *created_at,
                    })
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn delete_image(&self, image_id: &ImageId) -> RepoResult<u64> {
        let removed = self
            .likes
            .remove(image_id)
            .map_or(0, |(_, users)| users.len() as u64);
        tracing::info!(image_id = %image_id, removed, "Image likes deleted");
        Ok(removed)
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
