//! Client error types

use gallery_core::ImageId;
use thiserror::Error;

use crate::http::SseError;

/// Errors raised by the client runtime
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please set your username first")]
    MissingUserName,

    #[error("A toggle for image {0} is still in flight")]
    TogglePending(ImageId),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Event stream closed")]
    StreamClosed,

    #[error("Event stream broken: {0}")]
    Stream(#[from] SseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sync driver stopped")]
    DriverStopped,
}

impl ClientError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingUserName => "MISSING_USER_NAME",
            Self::TogglePending(_) => "TOGGLE_PENDING",
            Self::Http(_) => "HTTP_ERROR",
            Self::Status { .. } => "STATUS_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Decode(_) => "DECODE_ERROR",
            Self::StreamClosed => "STREAM_CLOSED",
            Self::Stream(_) => "STREAM_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::DriverStopped => "DRIVER_STOPPED",
        }
    }

    /// Whether the next sync cycle may succeed where this one failed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout | Self::StreamClosed | Self::Stream(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the request was refused before reaching the server
    pub fn is_local(&self) -> bool {
        matches!(self, Self::MissingUserName | Self::TogglePending(_) | Self::Config(_))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
