//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gallery_core::{Image, ImageId, LikeState, LikeStatus, PageInfo, UserName};
use serde::{Deserialize, Serialize};

// ============================================================================
// Like Responses
// ============================================================================

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleLikeResponse {
    pub success: bool,
    pub liked: bool,
    pub count: u64,
}

impl From<LikeStatus> for ToggleLikeResponse {
    fn from(status: LikeStatus) -> Self {
        Self {
            success: true,
            liked: status.liked,
            count: status.count,
        }
    }
}

/// `imageId -> {liked, count}`
pub type BatchStatusResponse = HashMap<ImageId, LikeStatus>;

/// Full like state of one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStateResponse {
    pub image_id: ImageId,
    pub count: u64,
    pub liked_by: Vec<UserName>,
    /// Present when the request named a viewer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

impl LikeStateResponse {
    pub fn new(state: LikeState, viewer: Option<&UserName>) -> Self {
        let liked = viewer.map(|v| state.liked_by.contains(v));
        Self {
            image_id: state.image_id,
            count: state.count,
            liked_by: state.liked_by.into_iter().collect(),
            liked,
        }
    }
}

// ============================================================================
// Image Responses
// ============================================================================

/// One gallery card: the image plus its like status for the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImageResponse {
    #[serde(flatten)]
    pub image: Image,
    pub likes: LikeStatus,
}

/// One page of the gallery feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPageResponse {
    pub images: Vec<GalleryImageResponse>,
    pub pagination: PageInfo,
}

/// Upload result, wrapping the image service's response body
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub data: serde_json::Value,
}

impl UploadResponse {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Delete result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageResponse {
    pub success: bool,
    /// Number of like records removed with the image
    pub removed_likes: u64,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each dependency
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub store: String,
    pub backend: &'static str,
    pub stream_subscribers: usize,
}

impl ReadinessResponse {
    pub fn ready(store_healthy: bool, backend: &'static str, stream_subscribers: usize) -> Self {
        Self {
            status: if store_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                store: if store_healthy { "healthy" } else { "unhealthy" }.to_string(),
                backend,
                stream_subscribers,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}
