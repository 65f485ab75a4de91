//! Image service
//!
//! Proxies listing, upload and deletion to the external image service and
//! builds the gallery feed with merged like status.

use gallery_core::{DomainError, ImagePage, ImageUpload, UploadMetadata, UserName};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{
    DeleteImageResponse, GalleryImageResponse, GalleryPageResponse, PageQuery,
    UploadMetadataRequest, UploadResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::like::{required_image_id, LikeService};

/// Raw file part of an upload as received from the client
#[derive(Debug, Clone, Default)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Image service
pub struct ImageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ImageService<'a> {
    /// Create a new ImageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// One page of images
    #[instrument(skip(self))]
    pub async fn list(&self, query: &PageQuery) -> ServiceResult<ImagePage> {
        let (page, limit) = self.page_bounds(query);
        Ok(self.ctx.catalog().list(page, limit).await?)
    }

    /// Validate and forward an upload.
    ///
    /// Size and MIME checks run locally; anything the image service rejects is
    /// surfaced with its own message.
    #[instrument(skip(self, file), fields(size = file.bytes.len()))]
    pub async fn upload(
        &self,
        file: UploadFile,
        metadata: UploadMetadataRequest,
    ) -> ServiceResult<UploadResponse> {
        metadata
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        if file.bytes.is_empty() {
            return Err(DomainError::upload_rejected("No image provided").into());
        }

        let max = self.ctx.limits().max_upload_bytes;
        if file.bytes.len() > max {
            return Err(DomainError::UploadRejected {
                status: Some(413),
                message: format!("File size exceeds {}MB limit", max / (1024 * 1024)),
            }
            .into());
        }

        let uploaded_by = metadata
            .uploaded_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(DomainError::MissingFields)?
            .to_string();

        let mut upload = ImageUpload {
            file_name: file.file_name.unwrap_or_else(|| "image".to_string()),
            content_type: file.content_type.unwrap_or_default(),
            bytes: file.bytes,
            metadata: UploadMetadata {
                description: String::new(),
                uploaded_by,
            },
        };

        if !upload.is_image() {
            return Err(DomainError::upload_rejected("Only image files are allowed").into());
        }

        upload.metadata.description = match metadata.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => upload.stem().to_string(),
        };

        let file_name = upload.file_name.clone();
        let data = self.ctx.catalog().upload(upload).await?;

        info!(file_name = %file_name, "Image uploaded");
        Ok(UploadResponse::new(data))
    }

    /// Delete an image and every like it had
    #[instrument(skip(self))]
    pub async fn delete(&self, image_id: &str) -> ServiceResult<DeleteImageResponse> {
        let image_id = required_image_id(Some(image_id))?;

        self.ctx.catalog().delete(&image_id).await?;
        let removed_likes = self.ctx.likes().delete_image(&image_id).await?;

        info!(image_id = %image_id, removed_likes, "Image deleted");
        Ok(DeleteImageResponse {
            success: true,
            removed_likes,
        })
    }

    /// One page of the gallery with like status merged in.
    ///
    /// The listing must succeed; like status degrades to empty if the store
    /// is down.
    #[instrument(skip(self))]
    pub async fn gallery(&self, query: &PageQuery) -> ServiceResult<GalleryPageResponse> {
        let viewer = match query.user_name.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(UserName::new(raw).map_err(DomainError::InvalidUserName)?),
        };

        let page = self.list(query).await?;
        let ids = page.image_ids();
        let mut statuses = LikeService::new(self.ctx)
            .batch_status_or_default(&ids, viewer.as_ref())
            .await;

        let images = page
            .images
            .into_iter()
            .map(|image| {
                let likes = statuses.remove(&image.id).unwrap_or_default();
                GalleryImageResponse { image, likes }
            })
            .collect();

        Ok(GalleryPageResponse {
            images,
            pagination: page.pagination,
        })
    }

    fn page_bounds(&self, query: &PageQuery) -> (u32, u32) {
        let limits = self.ctx.limits();
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(limits.default_page_limit)
            .clamp(1, limits.max_page_limit);

        if query.limit.is_some_and(|l| l != limit) {
            warn!(requested = query.limit, limit, "Page limit clamped");
        }
        (page, limit)
    }
}
