//! Route definitions
//!
//! Like, image and gallery routes share the rate limiter; health routes do not.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{gallery, health, images, likes};
use crate::state::AppState;

/// Room for the multipart framing and the metadata part
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router (excluding health for separate middleware handling)
pub fn create_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(like_routes())
        .merge(image_routes(max_upload_bytes))
        .route("/gallery", get(gallery::get_gallery))
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// Like routes
fn like_routes() -> Router<AppState> {
    Router::new()
        .route("/likes", post(likes::toggle_like).get(likes::batch_status))
        .route("/likes/poll", get(likes::poll_status))
        .route("/likes/stream", get(likes::like_stream))
        .route("/likes/:image_id/users", get(likes::like_users))
}

/// Image service proxy routes
fn image_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/images", get(images::list_images).post(images::upload_image))
        .route("/images/:image_id", delete(images::delete_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}
