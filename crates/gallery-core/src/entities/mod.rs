//! Domain entities - core business objects

mod image;
mod like;

pub use image::{Image, ImagePage, ImageUpload, PageInfo, UploadMetadata};
pub use like::{LikeRecord, LikeState, LikeStatus};
