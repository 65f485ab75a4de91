//! Request DTOs for API endpoints
//!
//! Field names follow the browser client's camelCase wire format. Required
//! fields are still `Option` so that a missing field yields the uniform
//! "Missing required fields" error instead of a deserializer message.

use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Like Requests
// ============================================================================

/// Toggle like request body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeRequest {
    #[validate(length(max = 128, message = "imageId must be at most 128 characters"))]
    pub image_id: Option<String>,

    #[validate(length(max = 64, message = "userName must be at most 64 characters"))]
    pub user_name: Option<String>,
}

impl ToggleLikeRequest {
    pub fn new(image_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            image_id: Some(image_id.into()),
            user_name: Some(user_name.into()),
        }
    }
}

/// Batch status query (`?ids=a,b,c&userName=alice`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusQuery {
    /// Comma-separated image ids
    pub ids: Option<String>,
    pub user_name: Option<String>,
}

/// Like state query for one image
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStateQuery {
    pub user_name: Option<String>,
}

/// Event stream query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    /// Events caused by this user are not echoed back
    pub user_name: Option<String>,
}

// ============================================================================
// Image Requests
// ============================================================================

/// Page query for image listings and the gallery feed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Viewer for the merged like status (gallery feed only)
    pub user_name: Option<String>,
}

/// Metadata part of a multipart upload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadataRequest {
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[validate(length(max = 64, message = "uploadedBy must be at most 64 characters"))]
    #[serde(default)]
    pub uploaded_by: Option<String>,
}
