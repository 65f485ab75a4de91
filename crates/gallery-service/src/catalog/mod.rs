//! Image catalog clients

mod http_catalog;

pub use http_catalog::HttpImageCatalog;
