//! Database models (SQLx `FromRow`)

mod like;

pub use like::{LikeCountModel, LikeModel};
