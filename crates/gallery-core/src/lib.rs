//! # gallery-core
//!
//! Domain layer containing like entities, value objects, store traits, and change events.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Image, ImagePage, ImageUpload, LikeRecord, LikeState, LikeStatus, PageInfo, UploadMetadata,
};
pub use error::DomainError;
pub use events::{ChangeKind, LikeEvent};
pub use traits::{
    complete_batch, ChangeNotifier, ImageCatalog, LikeRepository, RepoResult,
};
pub use value_objects::{IdParseError, ImageId, UserName};
