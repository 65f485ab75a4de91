//! Repository implementations

mod error;
mod like;

pub use error::map_db_error;
pub use like::PgLikeRepository;
