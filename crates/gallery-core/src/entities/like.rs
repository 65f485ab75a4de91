//! Like entities - records, per-user status, and aggregate state

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ImageId, UserName};

/// One user's like on one image.
///
/// At most one record exists per `(image_id, user_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRecord {
    pub image_id: ImageId,
    pub user_name: UserName,
    pub created_at: DateTime<Utc>,
}

impl LikeRecord {
    /// Create a new LikeRecord stamped now
    pub fn new(image_id: ImageId, user_name: UserName) -> Self {
        Self {
            image_id,
            user_name,
            created_at: Utc::now(),
        }
    }
}

/// Like status of one image as seen by one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
    pub count: u64,
}

impl LikeStatus {
    pub const fn new(liked: bool, count: u64) -> Self {
        Self { liked, count }
    }

    /// Status of an image nobody has liked
    pub const fn empty() -> Self {
        Self {
            liked: false,
            count: 0,
        }
    }
}

/// Aggregate like state of one image, derived from its records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeState {
    pub image_id: ImageId,
    pub count: u64,
    pub liked_by: BTreeSet<UserName>,
}

impl LikeState {
    /// Build the state from the image's like records
    pub fn from_records(image_id: ImageId, records: impl IntoIterator<Item = LikeRecord>) -> Self {
        let liked_by: BTreeSet<UserName> = records
            .into_iter()
            .filter(|r| r.image_id == image_id)
            .map(|r| r.user_name)
            .collect();

        Self {
            image_id,
            count: liked_by.len() as u64,
            liked_by,
        }
    }

    /// Project the state for one viewer
    pub fn status_for(&self, user_name: &UserName) -> LikeStatus {
        LikeStatus {
            liked: self.liked_by.contains(user_name),
            count: self.count,
        }
    }

    /// `count == |likedBy|`
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.count == self.liked_by.len() as u64
    }
}
