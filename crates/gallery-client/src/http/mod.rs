//! HTTP access to the like API.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST /likes` toggle
//! - `GET /likes/poll?ids=&userName=` batch status (counts only without a name)
//! - `GET /likes/stream?userName=` server-sent like events

mod sse;

pub use sse::{SseDecoder, SseError, SseFrame, MAX_LINE_BYTES};

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use gallery_core::{ImageId, LikeEvent, LikeStatus, UserName};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Stream of decoded like events
pub type LikeEventStream = BoxStream<'static, ClientResult<LikeEvent>>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleBody<'a> {
    image_id: &'a ImageId,
    user_name: &'a UserName,
}

#[derive(Deserialize)]
struct ToggleReply {
    success: bool,
    liked: bool,
    count: u64,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

/// Thin typed wrapper over the like endpoints
#[derive(Debug, Clone)]
pub struct LikesClient {
    client: Client,
    base_url: String,
    user_name: Option<UserName>,
    request_timeout: Duration,
}

impl LikesClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        // No overall timeout: the event stream stays open indefinitely
        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_name: config.user_name.clone(),
            request_timeout: config.request_timeout,
        }
    }

    pub fn user_name(&self) -> Option<&UserName> {
        self.user_name.as_ref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Toggle the session user's like on one image
    #[instrument(skip(self))]
    pub async fn toggle(&self, image_id: &ImageId) -> ClientResult<LikeStatus> {
        let user_name = self.user_name.as_ref().ok_or(ClientError::MissingUserName)?;

        let response = self
            .client
            .post(self.endpoint("likes"))
            .timeout(self.request_timeout)
            .json(&ToggleBody { image_id, user_name })
            .send()
            .await
            .map_err(map_request_error)?;

        let reply: ToggleReply = decode(check_status(response).await?).await?;
        if !reply.success {
            return Err(ClientError::Decode("toggle reported failure".to_string()));
        }
        Ok(LikeStatus::new(reply.liked, reply.count))
    }

    /// Current status of every id, from the session user's point of view.
    ///
    /// Anonymous sessions get counts only. Always a single request.
    #[instrument(skip(self, image_ids), fields(count = image_ids.len()))]
    pub async fn batch_status(
        &self,
        image_ids: &[ImageId],
    ) -> ClientResult<HashMap<ImageId, LikeStatus>> {
        if image_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = ImageId::join_csv(image_ids);
        let mut request = self
            .client
            .get(self.endpoint("likes/poll"))
            .timeout(self.request_timeout)
            .query(&[("ids", ids.as_str())]);
        if let Some(user_name) = &self.user_name {
            request = request.query(&[("userName", user_name.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(map_request_error)?;

        let statuses: HashMap<ImageId, LikeStatus> = decode(check_status(response).await?).await?;
        debug!(returned = statuses.len(), "Batch status fetched");
        Ok(statuses)
    }

    /// Status of a single image
    pub async fn status(&self, image_id: &ImageId) -> ClientResult<LikeStatus> {
        let statuses = self.batch_status(std::slice::from_ref(image_id)).await?;
        Ok(statuses.get(image_id).copied().unwrap_or_default())
    }

    /// Open the like event stream.
    ///
    /// The server leaves out the session user's own events. The stream ends
    /// when the connection closes.
    #[instrument(skip(self))]
    pub async fn open_stream(&self) -> ClientResult<LikeEventStream> {
        let mut request = self
            .client
            .get(self.endpoint("likes/stream"))
            .header(header::ACCEPT, "text/event-stream");
        if let Some(user_name) = &self.user_name {
            request = request.query(&[("userName", user_name.as_str())]);
        }

        // Only the response head is bounded; the body is open-ended
        let response = tokio::time::timeout(self.request_timeout, request.send())
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(map_request_error)?;
        let response = check_status(response).await?;
        debug!("Like stream connected");

        let bytes = Box::pin(response.bytes_stream());
        let events = stream::unfold(
            (Some(bytes), SseDecoder::new(), VecDeque::new()),
            |(mut bytes, mut decoder, mut queued)| async move {
                loop {
                    if let Some(item) = queued.pop_front() {
                        return Some((item, (bytes, decoder, queued)));
                    }
                    // Ends after a broken body has been reported
                    let body = bytes.as_mut()?;
                    match body.next().await {
                        Some(Ok(chunk)) => match decoder.push(&chunk) {
                            Ok(frames) => queued.extend(frames.iter().map(decode_event)),
                            Err(e) => {
                                warn!(error = %e, "Abandoning like stream");
                                return Some((Err(e.into()), (None, decoder, queued)));
                            }
                        },
                        Some(Err(e)) => {
                            return Some((Err(map_request_error(e)), (bytes, decoder, queued)));
                        }
                        None => return None,
                    }
                }
            },
        );
        Ok(events.boxed())
    }
}

fn decode_event(frame: &SseFrame) -> ClientResult<LikeEvent> {
    serde_json::from_str(&frame.data).map_err(|e| {
        warn!(error = %e, "Undecodable like event");
        ClientError::Decode(e.to_string())
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Turn a non-success response into [`ClientError::Status`] with the server's message
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorReply>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

fn map_request_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(err)
    }
}
