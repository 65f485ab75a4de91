//! Gallery feed handler

use axum::{extract::State, Json};
use gallery_service::dto::{GalleryPageResponse, PageQuery};
use gallery_service::ImageService;

use crate::extractors::ApiQuery;
use crate::response::ApiResult;
use crate::state::AppState;

/// One page of images with the viewer's like status merged in
///
/// GET /gallery?page=&limit=&userName=
pub async fn get_gallery(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<GalleryPageResponse>> {
    let service = ImageService::new(state.service_context());
    Ok(Json(service.gallery(&query).await?))
}
