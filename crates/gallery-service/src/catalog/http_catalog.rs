//! HTTP client for the external image service.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET list-images?page=&limit=`
//! - `POST upload-image` (multipart `image` + JSON `metadata`)
//! - `DELETE delete-image?id=`

use std::time::Duration;

use async_trait::async_trait;
use gallery_common::ImageServiceConfig;
use gallery_core::{DomainError, ImageCatalog, ImageId, ImagePage, ImageUpload, RepoResult};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

/// Image catalog backed by the image service's HTTP API
#[derive(Debug, Clone)]
pub struct HttpImageCatalog {
    client: Client,
    base_url: String,
}

impl HttpImageCatalog {
    /// Build a client with the configured request timeout
    pub fn new(config: &ImageServiceConfig) -> RepoResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::InternalError(format!("HTTP client: {e}")))?;

        Ok(Self::with_client(client, &config.url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl ImageCatalog for HttpImageCatalog {
    #[instrument(skip(self))]
    async fn list(&self, page: u32, limit: u32) -> RepoResult<ImagePage> {
        let response = self
            .client
            .get(self.endpoint("list-images"))
            .query(&[("page", page), ("limit", limit)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Image listing failed");
            return Err(DomainError::ImageServiceError(
                "Failed to fetch images".to_string(),
            ));
        }

        response
            .json::<ImagePage>()
            .await
            .map_err(|e| DomainError::ImageServiceError(format!("Malformed image listing: {e}")))
    }

    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.size()))]
    async fn upload(&self, upload: ImageUpload) -> RepoResult<serde_json::Value> {
        let metadata = serde_json::to_string(&upload.metadata)
            .map_err(|e| DomainError::InternalError(e.to_string()))?;
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|_| DomainError::upload_rejected("Only image files are allowed"))?;
        let form = Form::new().part("image", part).text("metadata", metadata);

        let response = self
            .client
            .post(self.endpoint("upload-image"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::UploadRejected {
                        status: Some(StatusCode::GATEWAY_TIMEOUT.as_u16()),
                        message: "Upload timed out".to_string(),
                    }
                } else {
                    map_request_error(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // The service explains rejections in a `message` field
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("message")?.as_str().map(str::to_string))
                .unwrap_or_else(|| "Upload failed".to_string());

            warn!(status = %status, message = %message, "Upload rejected by image service");
            return Err(DomainError::UploadRejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| DomainError::ImageServiceError(format!("Malformed upload response: {e}")))?;
        debug!("Upload accepted");
        Ok(body)
    }

    #[instrument(skip(self))]
    async fn delete(&self, image_id: &ImageId) -> RepoResult<()> {
        let response = self
            .client
            .delete(self.endpoint("delete-image"))
            .query(&[("id", image_id.as_str())])
            .send()
            .await
            .map_err(map_request_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(DomainError::ImageNotFound(image_id.clone())),
            status => Err(DomainError::ImageServiceError(format!(
                "Delete failed with status {status}"
            ))),
        }
    }
}

fn map_request_error(err: reqwest::Error) -> DomainError {
    if err.is_timeout() {
        DomainError::ImageServiceError("Image service timed out".to_string())
    } else {
        DomainError::ImageServiceError(err.to_string())
    }
}
