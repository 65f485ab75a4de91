//! Like handlers
//!
//! Toggle, batch status (plain and polling), per-image state, and the
//! server-sent event stream.

use std::time::Duration;

use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use gallery_core::{DomainError, UserName};
use gallery_service::dto::{
    BatchStatusQuery, BatchStatusResponse, LikeStateQuery, LikeStateResponse, StreamQuery,
    ToggleLikeRequest, ToggleLikeResponse,
};
use gallery_service::LikeService;
use tracing::info;

use crate::extractors::{ApiQuery, ImageIdPath, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// Like if absent, unlike if present
///
/// POST /likes
pub async fn toggle_like(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ToggleLikeRequest>,
) -> ApiResult<Json<ToggleLikeResponse>> {
    let service = LikeService::new(state.service_context());
    Ok(Json(service.toggle(request).await?))
}

/// Status of many images for one viewer
///
/// GET /likes?ids=a,b,c&userName=alice
pub async fn batch_status(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BatchStatusQuery>,
) -> ApiResult<Json<BatchStatusResponse>> {
    let service = LikeService::new(state.service_context());
    Ok(Json(service.batch_status(query).await?))
}

/// Same as [`batch_status`], never cached. Clients call it every couple of seconds.
///
/// GET /likes/poll?ids=a,b,c&userName=alice
pub async fn poll_status(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BatchStatusQuery>,
) -> ApiResult<impl IntoResponse> {
    let service = LikeService::new(state.service_context());
    let statuses = service.batch_status(query).await?;
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(statuses)))
}

/// Who liked one image
///
/// GET /likes/:image_id/users?userName=alice
pub async fn like_users(
    State(state): State<AppState>,
    ImageIdPath(image_id): ImageIdPath,
    ApiQuery(query): ApiQuery<LikeStateQuery>,
) -> ApiResult<Json<LikeStateResponse>> {
    let service = LikeService::new(state.service_context());
    Ok(Json(service.state(&image_id, query.user_name.as_deref()).await?))
}

/// Live like changes, excluding the viewer's own
///
/// GET /likes/stream?userName=alice
pub async fn like_stream(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StreamQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let viewer = match query.user_name.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(UserName::new(raw).map_err(DomainError::InvalidUserName)?),
    };

    info!(
        viewer = viewer.as_ref().map(UserName::as_str),
        subscribers = state.hub().receiver_count() + 1,
        "Like stream opened"
    );

    let events = state
        .hub()
        .subscribe_excluding(viewer)
        .map(|event| Event::default().json_data(&event));

    let keepalive = Duration::from_secs(state.config().stream.keepalive_secs.max(1));
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(keepalive)))
}
