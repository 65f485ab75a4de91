//! Like entity <-> model mapper

use gallery_core::{DomainError, ImageId, LikeRecord, LikeStatus, UserName};

use crate::models::{LikeCountModel, LikeModel};

/// Convert LikeModel to LikeRecord, rejecting rows that no longer validate
impl TryFrom<LikeModel> for LikeRecord {
    type Error = DomainError;

    fn try_from(model: LikeModel) -> Result<Self, Self::Error> {
        Ok(LikeRecord {
            image_id: ImageId::new(model.image_id).map_err(DomainError::InvalidImageId)?,
            user_name: UserName::new(model.user_name).map_err(DomainError::InvalidUserName)?,
            created_at: model.created_at,
        })
    }
}

/// Convert an aggregate row into the image id and its status
pub fn count_to_status(model: LikeCountModel) -> Result<(ImageId, LikeStatus), DomainError> {
    let image_id = ImageId::new(model.image_id).map_err(DomainError::InvalidImageId)?;
    let count = u64::try_from(model.count).unwrap_or(0);
    Ok((image_id, LikeStatus::new(model.liked.unwrap_or(false), count)))
}
