//! Test fixtures and wire types
//!
//! Request and response shapes as a browser would see them.

use std::sync::atomic::{AtomicU64, Ordering};

use gallery_core::{Image, ImageId};
use serde::{Deserialize, Serialize};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A user name no other test uses
pub fn unique_user(prefix: &str) -> String {
    format!("{prefix}{}", unique_suffix())
}

/// An image id no other test uses
pub fn unique_image() -> String {
    format!("img-{}", unique_suffix())
}

/// Toggle request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub image_id: Option<String>,
    pub user_name: Option<String>,
}

impl ToggleRequest {
    pub fn new(image_id: &str, user_name: &str) -> Self {
        Self {
            image_id: Some(image_id.to_string()),
            user_name: Some(user_name.to_string()),
        }
    }
}

/// Toggle response
#[derive(Debug, Deserialize)]
pub struct ToggleReply {
    pub success: bool,
    pub liked: bool,
    pub count: u64,
}

/// Status of one image in a batch response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatusReply {
    pub liked: bool,
    pub count: u64,
}

impl StatusReply {
    pub const fn new(liked: bool, count: u64) -> Self {
        Self { liked, count }
    }
}

/// Error body
#[derive(Debug, Deserialize)]
pub struct ErrorReply {
    pub success: bool,
    pub error: String,
    pub code: String,
}

/// Full like state of one image
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStateReply {
    pub image_id: String,
    pub count: u64,
    pub liked_by: Vec<String>,
    pub liked: Option<bool>,
}

/// One gallery entry: the image plus its like status
#[derive(Debug, Deserialize)]
pub struct GalleryEntry {
    pub id: String,
    pub description: String,
    pub likes: StatusReply,
}

#[derive(Debug, Deserialize)]
pub struct GalleryReply {
    pub images: Vec<GalleryEntry>,
}

/// Image record served by the stub image service
pub fn sample_image(id: &str, uploaded_by: &str) -> Image {
    Image {
        id: ImageId::new(id).unwrap_or_else(|e| panic!("bad fixture id {id}: {e}")),
        description: format!("Photo {id}"),
        uploaded_by: uploaded_by.to_string(),
        created_at: "2026-01-01T00:00:00Z".to_string(),
        original_url: format!("https://cdn.test/{id}/original.jpg"),
        gallery_url: format!("https://cdn.test/{id}/gallery.jpg"),
        thumbnail_url: format!("https://cdn.test/{id}/thumb.jpg"),
    }
}

/// A few bytes the server will accept as a PNG upload
pub fn png_bytes() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0]
}
