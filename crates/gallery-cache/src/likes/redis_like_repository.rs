//! Redis like store.
//!
//! Each image owns one sorted set `image:{id}:likedBy` whose members are user
//! names scored by the like time in milliseconds. The count is always the set
//! cardinality, so the two can never drift apart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use gallery_core::{
    complete_batch, DomainError, ImageId, LikeRecord, LikeRepository, LikeStatus, RepoResult,
    UserName,
};
use redis::{AsyncCommands, Script, Value};
use tracing::instrument;

use crate::pool::{RedisPool, RedisPoolError};

/// Like if absent, unlike if present. Returns `{liked, count}`.
const TOGGLE_SCRIPT: &str = r"
local key = KEYS[1]
local member = ARGV[1]
if redis.call('ZSCORE', key, member) then
  redis.call('ZREM', key, member)
  return {0, redis.call('ZCARD', key)}
end
redis.call('ZADD', key, ARGV[2], member)
return {1, redis.call('ZCARD', key)}
";

/// Redis key holding the users who liked an image
pub fn liked_by_key(image_id: &ImageId) -> String {
    format!("image:{image_id}:likedBy")
}

/// Map a Redis failure to a domain error
pub fn map_redis_error(e: RedisPoolError) -> DomainError {
    if e.is_unavailable() {
        tracing::warn!(error = %e, "Redis unavailable");
        DomainError::StoreUnavailable(e.to_string())
    } else {
        tracing::error!(error = %e, "Redis command failed");
        DomainError::CacheError(e.to_string())
    }
}

/// Like store backed by Redis
#[derive(Clone)]
pub struct RedisLikeRepository {
    pool: RedisPool,
    toggle_script: Script,
}

impl RedisLikeRepository {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self {
            pool,
            toggle_script: Script::new(TOGGLE_SCRIPT),
        }
    }

    async fn toggle_inner(
        &self,
        image_id: &ImageId,
        user_name: &UserName,
    ) -> Result<LikeStatus, RedisPoolError> {
        let mut conn = self.pool.get().await?;
        let (liked, count): (i64, u64) = self
            .toggle_script
            .key(liked_by_key(image_id))
            .arg(user_name.as_str())
            .arg(Utc::now().timestamp_millis())
            .invoke_async(&mut conn)
            .await?;

        Ok(LikeStatus::new(liked == 1, count))
    }

    async fn batch_inner(
        &self,
        image_ids: &[ImageId],
        user_name: &UserName,
    ) -> Result<HashMap<ImageId, LikeStatus>, RedisPoolError> {
        let mut pipe = redis::pipe();
        for id in image_ids {
            let key = liked_by_key(id);
            pipe.zcard(&key).zscore(&key, user_name.as_str());
        }

        let mut conn = self.pool.get().await?;
        let replies: Vec<Value> = pipe.query_async(&mut conn).await?;

        if replies.len() != image_ids.len() * 2 {
            return Err(RedisPoolError::UnexpectedReply(format!(
                "expected {} replies, got {}",
                image_ids.len() * 2,
                replies.len()
            )));
        }

        let mut statuses = HashMap::with_capacity(image_ids.len());
        for (id, pair) in image_ids.iter().zip(replies.chunks_exact(2)) {
            let count: u64 = redis::from_redis_value(&pair[0])?;
            let score: Option<f64> = redis::from_redis_value(&pair[1])?;
            statuses.insert(id.clone(), LikeStatus::new(score.is_some(), count));
        }

        Ok(statuses)
    }

    async fn counts_inner(
        &self,
        image_ids: &[ImageId],
    ) -> Result<HashMap<ImageId, LikeStatus>, RedisPoolError> {
        let mut pipe = redis::pipe();
        for id in image_ids {
            pipe.zcard(liked_by_key(id));
        }

        let mut conn = self.pool.get().await?;
        let counts: Vec<u64> = pipe.query_async(&mut conn).await?;
        if counts.len() != image_ids.len() {
            return Err(RedisPoolError::UnexpectedReply(format!(
                "expected {} replies, got {}",
                image_ids.len(),
                counts.len()
            )));
        }

        Ok(image_ids
            .iter()
            .zip(counts)
            .map(|(id, count)| (id.clone(), LikeStatus::new(false, count)))
            .collect())
    }

    async fn likes_inner(&self, image_id: &ImageId) -> Result<Vec<LikeRecord>, RedisPoolError> {
        let mut conn = self.pool.get().await?;
        let members: Vec<(String, f64)> = conn
            .zrange_withscores(liked_by_key(image_id), 0, -1)
            .await?;

        let mut records = Vec::with_capacity(members.len());
        for (member, score) in members {
            let user_name = UserName::new(member).map_err(|e| {
                RedisPoolError::UnexpectedReply(format!("bad member in likedBy set: {e}"))
            })?;
            let created_at = Utc
                .timestamp_millis_opt(score as i64)
                .single()
                .unwrap_or_else(Utc::now);
            records.push(LikeRecord {
                image_id: image_id.clone(),
                user_name,
                created_at,
            });
        }
        Ok(records)
    }

    async fn delete_inner(&self, image_id: &ImageId) -> Result<u64, RedisPoolError> {
        let key = liked_by_key(image_id);
        let mut conn = self.pool.get().await?;
        let (removed, _): (u64, u64) = redis::pipe()
            .atomic()
            .zcard(&key)
            .del(&key)
            .query_async(&mut conn)
            .await?;
        Ok(removed)
    }
}

#[async_trait]
impl LikeRepository for RedisLikeRepository {
    #[instrument(skip(self))]
    async fn toggle(&self, image_id: &ImageId, user_name: &UserName) -> RepoResult<LikeStatus> {
        let status = self
            .toggle_inner(image_id, user_name)
            .await
            .map_err(map_redis_error)?;

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
            .batch_inner(std::slice::from_ref(image_id), user_name)
            .await
            .map_err(map_redis_error)?;
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

        let found = self
            .batch_inner(image_ids, user_name)
            .await
            .map_err(map_redis_error)?;
        Ok(complete_batch(image_ids, found))
    }

    #[instrument(skip(self, image_ids), fields(ids = image_ids.len()))]
    async fn batch_counts(&self, image_ids: &[ImageId]) -> RepoResult<HashMap<ImageId, LikeStatus>> {
        if image_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let found = self.counts_inner(image_ids).await.map_err(map_redis_error)?;
        Ok(complete_batch(image_ids, found))
    }

    #[instrument(skip(self))]
    async fn likes(&self, image_id: &ImageId) -> RepoResult<Vec<LikeRecord>> {
        self.likes_inner(image_id).await.map_err(map_redis_error)
    }

    #[instrument(skip(self))]
    async fn delete_image(&self, image_id: &ImageId) -> RepoResult<u64> {
        let removed = self.delete_inner(image_id).await.map_err(map_redis_error)?;
        tracing::info!(image_id = %image_id, removed, "Image likes deleted");
        Ok(removed)
    }

    async fn ping(&self) -> RepoResult<()> {
        self.pool.health_check().await.map_err(map_redis_error)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::RedisPoolConfig;

    #[test]
    fn test_key_format() {
        let id = ImageId::new("abc123").unwrap();
        assert_eq!(liked_by_key(&id), "image:abc123:likedBy");
    }

    #[test]
    fn test_unexpected_reply_is_not_unavailable() {
        let err = map_redis_error(RedisPoolError::UnexpectedReply("x".to_string()));
        assert!(matches!(err, DomainError::CacheError(_)));
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_retryable() {
        let pool = RedisPool::new(RedisPoolConfig {
            url: "redis://127.0.0.1:1".to_string(),
            password: None,
            max_connections: 1,
        })
        .unwrap();
        let repo = RedisLikeRepository::new(pool);

        let err = repo
            .toggle(&ImageId::new("img1").unwrap(), &UserName::new("alice").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_redis() {
        let pool = RedisPool::new(RedisPoolConfig {
            url: "redis://127.0.0.1:1".to_string(),
            password: None,
            max_connections: 1,
        })
        .unwrap();
        let repo = RedisLikeRepository::new(pool);

        let result = repo
            .batch_status(&[], &UserName::new("alice").unwrap())
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(repo.batch_counts(&[]).await.unwrap().is_empty());
    }
}
