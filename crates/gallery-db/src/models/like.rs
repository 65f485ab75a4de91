//! Like database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the likes table
#[derive(Debug, Clone, FromRow)]
pub struct LikeModel {
    pub image_id: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

/// Per-image aggregate (from the batch query)
#[derive(Debug, Clone, FromRow)]
pub struct LikeCountModel {
    pub image_id: String,
    pub count: i64,
    pub liked: Option<bool>,
}
