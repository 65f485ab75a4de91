//! Client configuration
//!
//! Built once per session and read-only afterwards.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use gallery_core::UserName;

use crate::error::ClientError;

/// Default interval between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default bound on a single request or strategy call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How the client learns about other users' likes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Batch-fetch the visible images on a fixed cadence
    #[default]
    Poll,
    /// Apply the payload of each streamed event
    Push,
    /// Refetch the one image named by each streamed event
    Subscribe,
}

impl StrategyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Push => "push",
            Self::Subscribe => "subscribe",
        }
    }

    /// Whether the strategy holds an event stream open
    pub const fn is_streaming(self) -> bool {
        !matches!(self, Self::Poll)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poll" | "polling" => Ok(Self::Poll),
            "push" | "sse" => Ok(Self::Push),
            "subscribe" | "cdc" => Ok(Self::Subscribe),
            other => Err(ClientError::Config(format!("unknown sync strategy: {other}"))),
        }
    }
}

/// Client session configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Like API base URL, e.g. `http://localhost:3000`
    pub base_url: String,
    /// Display name; toggles are refused without one
    pub user_name: Option<UserName>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub strategy: StrategyKind,
    /// Capacity of the UI effect channel
    pub effect_buffer: usize,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_name: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            strategy: StrategyKind::default(),
            effect_buffer: 64,
        }
    }

    /// Set the display name. Blank names leave the session anonymous.
    pub fn with_user_name(mut self, name: &str) -> Result<Self, ClientError> {
        self.user_name = if name.trim().is_empty() {
            None
        } else {
            Some(UserName::new(name).map_err(|e| ClientError::Config(e.to_string()))?)
        };
        Ok(self)
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
