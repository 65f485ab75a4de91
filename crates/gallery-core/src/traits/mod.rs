//! Store and collaborator traits

mod repositories;

pub use repositories::{
    complete_batch, ChangeNotifier, ImageCatalog, LikeRepository, RepoResult,
};
