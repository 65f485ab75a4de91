//! Path parameter extractors

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::response::ApiError;

/// Raw `:image_id` path segment. Validation happens in the service layer.
#[derive(Debug, Clone)]
pub struct ImageIdPath(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ImageIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(image_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.to_string()))?;

        Ok(ImageIdPath(image_id))
    }
}
