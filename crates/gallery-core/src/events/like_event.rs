//! Like change events
//!
//! Emitted whenever the like store changes, either by the service after a
//! toggle (pub/sub) or by the database itself (change feed). Consumers must
//! treat them as at-most-once and idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::LikeStatus;
use crate::value_objects::{ImageId, UserName};

/// Kind of store change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// A like record was created
    Insert,
    /// A like record was removed
    Delete,
}

impl ChangeKind {
    /// Kind matching the resulting liked flag
    pub const fn from_liked(liked: bool) -> Self {
        if liked {
            Self::Insert
        } else {
            Self::Delete
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Delete => "DELETE",
        }
    }
}

/// A change to one image's likes, as carried over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeEvent {
    pub image_id: ImageId,
    pub user_name: UserName,
    pub liked: bool,
    pub count: u64,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl LikeEvent {
    /// Build the event for a completed toggle
    pub fn from_toggle(image_id: ImageId, user_name: UserName, status: LikeStatus) -> Self {
        Self {
            image_id,
            user_name,
            liked: status.liked,
            count: status.count,
            kind: ChangeKind::from_liked(status.liked),
            timestamp: Utc::now(),
        }
    }

    /// Whether a new like was created
    #[inline]
    pub fn is_insert(&self) -> bool {
        self.kind == ChangeKind::Insert
    }

    /// Whether `user_name` caused this change
    #[inline]
    pub fn originated_by(&self, user_name: &UserName) -> bool {
        &self.user_name == user_name
    }

    /// Status carried by the event
    pub fn status(&self) -> LikeStatus {
        LikeStatus::new(self.liked, self.count)
    }
}
