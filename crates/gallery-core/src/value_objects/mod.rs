//! Value objects - immutable types that represent domain concepts

mod image_id;
mod user_name;

pub use image_id::{IdParseError, ImageId};
pub use user_name::UserName;
