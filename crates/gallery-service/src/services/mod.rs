//! Business logic services
//!
//! Like and image use cases, the dependency container, and the fan-out hub
//! feeding the event stream.

pub mod context;
pub mod error;
pub mod hub;
pub mod image;
pub mod like;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{ServiceContext, ServiceContextBuilder, ServiceLimits};
pub use error::{ServiceError, ServiceResult};
pub use hub::{LikeHub, DEFAULT_HUB_CAPACITY};
pub use image::{ImageService, UploadFile};
pub use like::LikeService;
