//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod gallery;
pub mod health;
pub mod images;
pub mod likes;
