//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{IdParseError, ImageId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Missing required fields")]
    MissingFields,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid image id: {0}")]
    InvalidImageId(IdParseError),

    #[error("Invalid user name: {0}")]
    InvalidUserName(IdParseError),

    #[error("Too many image ids: max {max}")]
    TooManyIds { max: usize },

    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Image not found: {0}")]
    ImageNotFound(ImageId),

    // =========================================================================
    // Upload Errors
    // =========================================================================
    /// Rejected either locally or by the image service. The message is shown to
    /// the user as is.
    #[error("{message}")]
    UploadRejected {
        status: Option<u16>,
        message: String,
    },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Like store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Image service error: {0}")]
    ImageServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Validation
            Self::MissingFields => "MISSING_FIELDS",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidImageId(_) => "INVALID_IMAGE_ID",
            Self::InvalidUserName(_) => "INVALID_USER_NAME",
            Self::TooManyIds { .. } => "TOO_MANY_IDS",

            // Not Found
            Self::ImageNotFound(_) => "UNKNOWN_IMAGE",

            // Upload
            Self::UploadRejected { .. } => "UPLOAD_REJECTED",

            // Infrastructure
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::ImageServiceError(_) => "IMAGE_SERVICE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ImageNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFields
                | Self::ValidationError(_)
                | Self::InvalidImageId(_)
                | Self::InvalidUserName(_)
                | Self::TooManyIds { .. }
        )
    }

    /// Check if the failure is transient and a later attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::DatabaseError(_) | Self::CacheError(_)
        )
    }

    /// Check if this is an upload rejection
    pub fn is_upload_rejected(&self) -> bool {
        matches!(self, Self::UploadRejected { .. })
    }

    /// Create a locally detected upload rejection
    pub fn upload_rejected(message: impl Into<String>) -> Self {
        Self::UploadRejected {
            status: None,
            message: message.into(),
        }
    }
}
