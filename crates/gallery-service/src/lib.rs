//! # gallery-service
//!
//! Application layer: like and image use cases, the image service client,
//! the server-side event hub, and DTOs.

pub mod catalog;
pub mod dto;
pub mod services;

pub use catalog::HttpImageCatalog;
pub use services::{
    ImageService, LikeHub, LikeService, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceLimits, ServiceResult, UploadFile,
};
