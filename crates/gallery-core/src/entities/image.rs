//! Image entities owned by the external image service.
//!
//! The gallery only reads and forwards these. Field names follow the image
//! service's wire format.

use serde::{Deserialize, Serialize};

use crate::value_objects::ImageId;

/// Image record as returned by the image service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub uploaded_by: String,
    pub created_at: String,
    pub original_url: String,
    pub gallery_url: String,
    pub thumbnail_url: String,
}

/// Page metadata of an image listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_more: bool,
    pub items_per_page: u32,
}

/// One page of images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePage {
    pub images: Vec<Image>,
    pub pagination: PageInfo,
}

impl ImagePage {
    /// Ids of every image on the page, in display order
    pub fn image_ids(&self) -> Vec<ImageId> {
        self.images.iter().map(|i| i.id.clone()).collect()
    }
}

/// Metadata sent alongside an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub description: String,
    pub uploaded_by: String,
}

/// A file to upload
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub metadata: UploadMetadata,
}

impl ImageUpload {
    /// Size of the payload in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the declared MIME type is an image type
    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    /// File name without its extension, used as the default description
    pub fn stem(&self) -> &str {
        self.file_name
            .split('.')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.file_name)
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}
