//! Axum extractors for request handling
//!
//! Wrappers that turn extractor rejections into the uniform JSON error body.

mod path;
mod query;
mod validated;

pub use path::ImageIdPath;
pub use query::ApiQuery;
pub use validated::ValidatedJson;
