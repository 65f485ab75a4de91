//! Error handling utilities for repositories

use gallery_core::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    match e {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) | SqlxError::Tls(_) => {
            tracing::warn!(error = %e, "PostgreSQL unavailable");
            DomainError::StoreUnavailable(e.to_string())
        }
        _ => {
            tracing::error!(error = %e, "PostgreSQL query failed");
            DomainError::DatabaseError(e.to_string())
        }
    }
}
