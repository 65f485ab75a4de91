//! Like service
//!
//! Toggles, point reads and batch reads against the like store, plus
//! publication of the resulting change events.

use std::collections::HashMap;

use gallery_core::{
    complete_batch, DomainError, IdParseError, ImageId, LikeEvent, LikeState, LikeStatus,
    UserName,
};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::dto::{BatchStatusQuery, BatchStatusResponse, LikeStateResponse, ToggleLikeRequest, ToggleLikeResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Like service
pub struct LikeService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LikeService<'a> {
    /// Create a new LikeService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Like or unlike an image on behalf of a user.
    ///
    /// The change is published after the store commits. A failed publish is
    /// logged and does not fail the toggle; subscribers catch up on resync.
    #[instrument(skip(self))]
    pub async fn toggle(&self, request: ToggleLikeRequest) -> ServiceResult<ToggleLikeResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let image_id = required_image_id(request.image_id.as_deref())?;
        let user_name = required_user_name(request.user_name.as_deref())?;

        let status = self.ctx.likes().toggle(&image_id, &user_name).await?;

        info!(
            image_id = %image_id,
            user_name = %user_name,
            liked = status.liked,
            count = status.count,
            "Like toggled"
        );

        let event = LikeEvent::from_toggle(image_id, user_name, status);
        if let Err(e) = self.ctx.notifier().publish(&event).await {
            warn!(
                error = %e,
                notifier = self.ctx.notifier().name(),
                image_id = %event.image_id,
                "Failed to publish like change"
            );
        }

        Ok(ToggleLikeResponse::from(status))
    }

    /// Status of one image for one viewer
    #[instrument(skip(self))]
    pub async fn status(&self, image_id: &str, user_name: &str) -> ServiceResult<LikeStatus> {
        let image_id = required_image_id(Some(image_id))?;
        let user_name = required_user_name(Some(user_name))?;
        Ok(self.ctx.likes().status(&image_id, &user_name).await?)
    }

    /// Status of every id in a comma-separated list.
    ///
    /// A missing or empty id list yields an empty map. Every requested id is
    /// present in the result. Without a viewer name only counts are served
    /// and `liked` is false.
    #[instrument(skip(self))]
    pub async fn batch_status(&self, query: BatchStatusQuery) -> ServiceResult<BatchStatusResponse> {
        let ids = self.parse_ids(query.ids.as_deref())?;
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let found = match optional_user_name(query.user_name.as_deref())? {
            Some(user_name) => self.ctx.likes().batch_status(&ids, &user_name).await?,
            None => self.ctx.likes().batch_counts(&ids).await?,
        };

        debug!(requested = ids.len(), returned = found.len(), "Batch status served");
        Ok(complete_batch(&ids, found))
    }

    /// Batch status that never fails.
    ///
    /// Store failures degrade to `{liked: false, count: 0}` for every id.
    #[instrument(skip(self, image_ids), fields(count = image_ids.len()))]
    pub async fn batch_status_or_default(
        &self,
        image_ids: &[ImageId],
        user_name: Option<&UserName>,
    ) -> HashMap<ImageId, LikeStatus> {
        if image_ids.is_empty() {
            return HashMap::new();
        }

        let found = match user_name {
            Some(user_name) => self.ctx.likes().batch_status(image_ids, user_name).await,
            None => self.ctx.likes().batch_counts(image_ids).await,
        };

        match found {
            Ok(found) => complete_batch(image_ids, found),
            Err(e) => {
                warn!(error = %e, "Batch status failed, serving empty like status");
                complete_batch(image_ids, HashMap::new())
            }
        }
    }

    /// Full like state of one image
    #[instrument(skip(self))]
    pub async fn state(
        &self,
        image_id: &str,
        viewer: Option<&str>,
    ) -> ServiceResult<LikeStateResponse> {
        let image_id = required_image_id(Some(image_id))?;
        let viewer = optional_user_name(viewer)?;

        let records = self.ctx.likes().likes(&image_id).await?;
        let state = LikeState::from_records(image_id, records);
        debug_assert!(state.is_consistent());

        Ok(LikeStateResponse::new(state, viewer.as_ref()))
    }

    fn parse_ids(&self, csv: Option<&str>) -> ServiceResult<Vec<ImageId>> {
        let Some(csv) = csv else {
            return Ok(Vec::new());
        };

        let max = self.ctx.limits().max_batch_ids;
        let ids = ImageId::parse_csv(csv, max).map_err(|e| match e {
            IdParseError::TooMany { max } => DomainError::TooManyIds { max },
            other => DomainError::InvalidImageId(other),
        })?;
        Ok(ids)
    }
}

/// Parse a required image id; absent or blank is a missing field
pub(crate) fn required_image_id(raw: Option<&str>) -> ServiceResult<ImageId> {
    match raw.map(str::trim) {
        None | Some("") => Err(DomainError::MissingFields.into()),
        Some(raw) => Ok(ImageId::new(raw).map_err(DomainError::InvalidImageId)?),
    }
}

/// Parse an optional viewer name; absent or blank is anonymous
fn optional_user_name(raw: Option<&str>) -> ServiceResult<Option<UserName>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Ok(Some(UserName::new(raw).map_err(DomainError::InvalidUserName)?)),
    }
}

/// Parse a required user name; absent or blank is a missing field
pub(crate) fn required_user_name(raw: Option<&str>) -> ServiceResult<UserName> {
    match raw.map(str::trim) {
        None | Some("") => Err(DomainError::MissingFields.into()),
        Some(raw) => Ok(UserName::new(raw).map_err(DomainError::InvalidUserName)?),
    }
}
