//! Image handlers
//!
//! Thin proxies to the image service. Deleting an image also removes its likes.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use gallery_core::{DomainError, ImagePage};
use gallery_service::dto::{DeleteImageResponse, PageQuery, UploadMetadataRequest, UploadResponse};
use gallery_service::{ImageService, UploadFile};

use crate::extractors::{ApiQuery, ImageIdPath};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// One page of images, newest first
///
/// GET /images?page=&limit=
pub async fn list_images(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<ImagePage>> {
    let service = ImageService::new(state.service_context());
    Ok(Json(service.list(&query).await?))
}

/// Upload an image
///
/// POST /images (multipart: `image` file, `metadata` JSON `{description, uploadedBy}`)
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let max_mb = state.config().image_service.max_upload_size_mb;
    let mut file = UploadFile::default();
    let mut metadata = UploadMetadataRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_mb))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                file.file_name = field.file_name().map(str::to_string);
                file.content_type = field.content_type().map(str::to_string);
                file.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_mb))?
                    .to_vec();
            }
            Some("metadata") => {
                let text = field.text().await.map_err(|e| multipart_error(e, max_mb))?;
                metadata = serde_json::from_str(&text)
                    .map_err(|e| ApiError::invalid_body(format!("metadata: {e}")))?;
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let service = ImageService::new(state.service_context());
    Ok(Json(service.upload(file, metadata).await?))
}

/// Delete an image and its likes
///
/// DELETE /images/:image_id
pub async fn delete_image(
    State(state): State<AppState>,
    ImageIdPath(image_id): ImageIdPath,
) -> ApiResult<Json<DeleteImageResponse>> {
    let service = ImageService::new(state.service_context());
    Ok(Json(service.delete(&image_id).await?))
}

/// Body limit hits become an upload rejection; anything else is a bad body
fn multipart_error(err: MultipartError, max_mb: u32) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::UploadRejected {
            status: Some(StatusCode::PAYLOAD_TOO_LARGE.as_u16()),
            message: format!("File size exceeds {max_mb}MB limit"),
        }
        .into()
    } else {
        ApiError::invalid_body(err.body_text())
    }
}
