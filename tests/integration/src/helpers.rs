//! Test helpers for integration tests
//!
//! Provides a stub image service, a test server running the full API
//! against it, and response assertions.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode as AxumStatus,
    routing::{delete, get, post},
    Json, Router,
};
use gallery_api::{create_app, create_app_state};
use gallery_client::{ClientConfig, LikeEventStream, LikesClient, StrategyKind};
use gallery_common::AppConfig;
use gallery_core::{Image, ImageId};
use parking_lot::Mutex;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::fixtures::{sample_image, StatusReply, ToggleReply, ToggleRequest};

/// Description that makes the stub image service fail an upload with 546
pub const FAILING_DESCRIPTION: &str = "explode";

type ImageStore = Arc<Mutex<Vec<Image>>>;

/// In-process stand-in for the external image service.
///
/// Images are kept newest first.
pub struct StubImageService {
    pub addr: SocketAddr,
    images: ImageStore,
    _handle: JoinHandle<()>,
}

impl StubImageService {
    pub async fn start(seed: Vec<Image>) -> Result<Self> {
        let images: ImageStore = Arc::new(Mutex::new(seed));
        let router = Router::new()
            .route("/list-images", get(stub_list))
            .route("/upload-image", post(stub_upload))
            .route("/delete-image", delete(stub_delete))
            .with_state(images.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Ok(Self {
            addr,
            images,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.images.lock().iter().any(|i| i.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    /// Most recent upload
    pub fn newest(&self) -> Option<Image> {
        self.images.lock().first().cloned()
    }
}

async fn stub_list(
    State(images): State<ImageStore>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(6).max(1);

    let images = images.lock();
    let total = images.len();
    let slice: Vec<&Image> = images.iter().skip((page - 1) * limit).take(limit).collect();

    Json(serde_json::json!({
        "images": slice,
        "pagination": {
            "current_page": page,
            "total_pages": total.div_ceil(limit),
            "total_items": total,
            "has_more": page * limit < total,
            "items_per_page": limit
        }
    }))
}

async fn stub_upload(
    State(images): State<ImageStore>,
    mut multipart: Multipart,
) -> (AxumStatus, Json<serde_json::Value>) {
    let mut file_size = 0;
    let mut metadata = serde_json::Value::Null;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => file_size = field.bytes().await.map(|b| b.len()).unwrap_or(0),
            Some("metadata") => {
                let text = field.text().await.unwrap_or_default();
                metadata = serde_json::from_str(&text).unwrap_or_default();
            }
            _ => {}
        }
    }

    let description = metadata["description"].as_str().unwrap_or_default().to_string();
    if description == FAILING_DESCRIPTION {
        let status = AxumStatus::from_u16(546).unwrap_or(AxumStatus::INTERNAL_SERVER_ERROR);
        return (status, Json(serde_json::json!({"message": "Image processing failed"})));
    }
    if file_size == 0 {
        return (
            AxumStatus::BAD_REQUEST,
            Json(serde_json::json!({"message": "Empty file"})),
        );
    }

    let mut images = images.lock();
    let id = format!("up-{}", images.len() + 1);
    let mut image = sample_image(&id, metadata["uploadedBy"].as_str().unwrap_or_default());
    image.description = description;
    images.insert(0, image.clone());

    (
        AxumStatus::OK,
        Json(serde_json::json!({"success": true, "image": image})),
    )
}

async fn stub_delete(
    State(images): State<ImageStore>,
    Query(query): Query<HashMap<String, String>>,
) -> AxumStatus {
    let Some(id) = query.get("id") else {
        return AxumStatus::BAD_REQUEST;
    };
    let mut images = images.lock();
    let before = images.len();
    images.retain(|i| i.id.as_str() != id);
    if images.len() == before {
        AxumStatus::NOT_FOUND
    } else {
        AxumStatus::OK
    }
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub images: StubImageService,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with an empty image service
    pub async fn start() -> Result<Self> {
        Self::start_with_images(Vec::new()).await
    }

    /// Start a test server whose image service already holds `seed`
    pub async fn start_with_images(seed: Vec<Image>) -> Result<Self> {
        let images = StubImageService::start(seed).await?;
        let config = test_config(&images.base_url())?;
        Self::start_with_config(config, images).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig, images: StubImageService) -> Result<Self> {
        // Create app state
        let state = create_app_state(config).await?;

        // Build application
        let app = create_app(state);

        // Bind to a free port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        // Spawn server task
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        // Create HTTP client
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            client,
            images,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).send().await?)
    }

    /// Upload a file through `POST /images`
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        metadata: &serde_json::Value,
    ) -> Result<Response> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new()
            .part("image", part)
            .text("metadata", metadata.to_string());
        Ok(self.client.post(self.url("/images")).multipart(form).send().await?)
    }

    /// Toggle and expect success
    pub async fn toggle(&self, image_id: &str, user_name: &str) -> Result<ToggleReply> {
        let response = self
            .post("/likes", &ToggleRequest::new(image_id, user_name))
            .await?;
        assert_json(response, StatusCode::OK).await
    }

    /// Batch status through the polling endpoint
    pub async fn poll(&self, ids: &[&str], user_name: &str) -> Result<HashMap<String, StatusReply>> {
        let response = self
            .client
            .get(self.url("/likes/poll"))
            .query(&[("ids", ids.join(",")), ("userName", user_name.to_string())])
            .send()
            .await?;
        assert_json(response, StatusCode::OK).await
    }

    /// Client configuration pointing at this server
    pub fn client_config(&self, user_name: &str, strategy: StrategyKind) -> Result<ClientConfig> {
        Ok(ClientConfig::new(self.base_url())
            .with_user_name(user_name)?
            .with_strategy(strategy)
            .with_poll_interval(Duration::from_millis(100))
            .with_request_timeout(Duration::from_secs(2)))
    }

    /// Open the like event stream as `user_name`
    pub async fn open_stream(&self, user_name: &str) -> Result<LikeEventStream> {
        let config = self.client_config(user_name, StrategyKind::Push)?;
        Ok(LikesClient::new(&config)?.open_stream().await?)
    }
}

/// Create a test configuration: in-memory store, no effective rate limit
pub fn test_config(image_service_url: &str) -> Result<AppConfig> {
    let image_service_url = image_service_url.to_string();
    let config = AppConfig::from_lookup(move |key| {
        let value = match key {
            "API_PORT" => "0",
            "STORE_URL" => "memory://",
            "IMAGE_SERVICE_URL" => image_service_url.as_str(),
            "IMAGE_SERVICE_TIMEOUT_SECS" => "5",
            "RATE_LIMIT_REQUESTS_PER_SECOND" => "10000",
            "RATE_LIMIT_BURST" => "100000",
            "STREAM_KEEPALIVE_SECS" => "1",
            _ => return None,
        };
        Some(value.to_string())
    })
    .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    Ok(config)
}

/// Parse an image id, panicking on bad fixtures
pub fn image_id(raw: &str) -> ImageId {
    ImageId::new(raw).unwrap_or_else(|e| panic!("bad image id {raw}: {e}"))
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
