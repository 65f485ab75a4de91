//! Entity to model mappers
//!
//! Conversions between domain entities (gallery-core) and database models.

mod like;

pub use like::count_to_status;
