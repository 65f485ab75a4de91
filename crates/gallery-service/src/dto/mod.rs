//! Data transfer objects for API requests and responses

pub mod requests;
pub mod responses;

pub use requests::{
    BatchStatusQuery, LikeStateQuery, PageQuery, StreamQuery, ToggleLikeRequest,
    UploadMetadataRequest,
};

pub use responses::{
    BatchStatusResponse, DeleteImageResponse, GalleryImageResponse, GalleryPageResponse,
    HealthChecks, HealthResponse, LikeStateResponse, ReadinessResponse, ToggleLikeResponse,
    UploadResponse,
};
