//! PostgreSQL implementation of LikeRepository

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use gallery_core::entities::{LikeRecord, LikeStatus};
use gallery_core::traits::{complete_batch, LikeRepository, RepoResult};
use gallery_core::value_objects::{ImageId, UserName};

use crate::mappers::count_to_status;
use crate::models::{LikeCountModel, LikeModel};

use super::error::map_db_error;

/// PostgreSQL implementation of LikeRepository
#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    /// Create a new PgLikeRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    #[instrument(skip(self))]
    async fn toggle(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Serialize toggles of the same pair; other users proceed in parallel
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{image_id}:{user_name}"))
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM likes WHERE image_id = $1 AND user_name = $2
            "#,
        )
        .bind(image_id.as_str())
        .bind(user_name.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?
        .rows_affected();

        let liked = deleted == 0;
        if liked {
            sqlx::query(
                r#"
                INSERT INTO likes (image_id, user_name)
                VALUES ($1, $2)
                ON CONFLICT (image_id, user_name) DO NOTHING
                "#,
            )
            .bind(image_id.as_str())
            .bind(user_name.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM likes WHERE image_id = $1
            "#,
        )
        .bind(image_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        let status = LikeStatus::new(liked, u64::try_from(count).unwrap_or(0));
        tracing::info!(
            image_id = %image_id,
            user_name = %user_name,
            liked = status.liked,
            count = status.count,
            "Like toggled"
        );
        Ok(status)
    }

    #[instrument(skip(self))]
    async fn status(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus> {
        let mut statuses = self
            .batch_status(std::slice::from_ref(image_id), user_name)
            .await?;
        Ok(statuses.remove(image_id).unwrap_or_default())
    }

    #[instrument(skip(self, image_ids), fields(ids = image_ids.len()))]
    async fn batch_status(
        &self,
        image_ids: &[ImageId],
        user_name: &UserName,
    ) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        if image_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = image_ids.iter().map(|id| id.as_str().to_owned()).collect();
        let rows = sqlx::query_as::<_, LikeCountModel>(
            r#"
            SELECT image_id, COUNT(*) AS count, BOOL_OR(user_name = $2) AS liked
            FROM likes
            WHERE image_id = ANY($1)
            GROUP BY image_id
            "#,
        )
        .bind(ids)
        .bind(user_name.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let found = rows
            .into_iter()
            .map(count_to_status)
            .collect::<RepoResult<HashMap<_, _>>>()?;
        Ok(complete_batch(image_ids, found))
    }

    #[instrument(skip(self, image_ids), fields(ids = image_ids.len()))]
    async fn batch_counts(&self, image_ids: &[ImageId]) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        if image_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = image_ids.iter().map(|id| id.as_str().to_owned()).collect();
        let rows = sqlx::query_as::<_, LikeCountModel>(
            r#"
            SELECT image_id, COUNT(*) AS count, NULL::BOOLEAN AS liked
            FROM likes
            WHERE image_id = ANY($1)
            GROUP BY image_id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let found = rows
            .into_iter()
            .map(count_to_status)
            .collect::<RepoResult<HashMap<_, _>>>()?;
        Ok(complete_batch(image_ids, found))
    }

    #[instrument(skip(self))]
    async fn likes(&self, image_id: &ImageId) -> RepoResult<Vec<LikeRecord>> {
        let rows = sqlx::query_as::<_, LikeModel>(
            r#"
            SELECT image_id, user_name, created_at
            FROM likes
            WHERE image_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(image_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(LikeRecord::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn delete_image(&self, image_id: &ImageId) -> RepoResult<u64> {
        let removed = sqlx::query(
            r#"
            DELETE FROM likes WHERE image_id = $1
            "#,
        )
        .bind(image_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?
        .rows_affected();

        tracing::info!(image_id = %image_id, removed, "Image likes deleted");
        Ok(removed)
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
