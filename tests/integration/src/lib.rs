//! Integration test utilities for the gallery like service
//!
//! Spawns the full API on a random port with the in-memory like store and a
//! stub image service, so no external services are needed.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
