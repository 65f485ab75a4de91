//! Application configuration structs
//!
//! Loaded once from environment variables at startup and passed explicitly
//! into constructors.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub store: StoreConfig,
    pub image_service: ImageServiceConfig,
    pub stream: StreamConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Like store backend, chosen by the scheme of `STORE_URL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Postgres,
    Memory,
}

impl StoreBackend {
    /// Backend for a store URL
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| ConfigError::InvalidValue("STORE_URL", url.to_string()))?;

        match scheme.as_str() {
            "redis" | "rediss" => Ok(Self::Redis),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue("STORE_URL", url.to_string())),
        }
    }

    /// Whether the backend needs `STORE_TOKEN`
    #[must_use]
    pub fn requires_token(self) -> bool {
        !matches!(self, Self::Memory)
    }
}

/// Like store configuration
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    /// Auth token, injected as the connection password
    pub token: Option<String>,
    #[serde(default = "default_store_max_connections")]
    pub max_connections: u32,
    /// Pub/sub channel carrying like events
    #[serde(default = "default_likes_channel")]
    pub channel: String,
}

impl StoreConfig {
    /// Backend selected by the URL scheme
    pub fn backend(&self) -> Result<StoreBackend, ConfigError> {
        StoreBackend::from_url(&self.url)
    }

    /// Token for backends that need one
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingVar("STORE_TOKEN"))
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("channel", &self.channel)
            .finish()
    }
}

/// External image service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ImageServiceConfig {
    pub url: String,
    #[serde(default = "default_image_service_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u32,
}

impl ImageServiceConfig {
    /// Upload limit in bytes
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb as usize * 1024 * 1024
    }
}

/// Like event stream configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// Capacity of the server-side fan-out channel
    #[serde(default = "default_stream_buffer")]
    pub buffer: usize,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "gallery-likes".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_store_max_connections() -> u32 {
    10
}

fn default_likes_channel() -> String {
    "like-updates".to_string()
}

fn default_image_service_timeout() -> u64 {
    30
}

fn default_max_upload_size() -> u32 {
    10
}

fn default_keepalive_secs() -> u64 {
    15
}

fn default_stream_buffer() -> usize {
    1024
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_burst() -> u32 {
    100
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            var(key)
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidValue(key, s))
                })
                .transpose()
        };

        let store = StoreConfig {
            url: var("STORE_URL").ok_or(ConfigError::MissingVar("STORE_URL"))?,
            token: var("STORE_TOKEN").filter(|t| !t.is_empty()),
            max_connections: parsed("STORE_MAX_CONNECTIONS")?
                .map_or_else(default_store_max_connections, |v| v as u32),
            channel: var("LIKES_CHANNEL").unwrap_or_else(default_likes_channel),
        };

        // Fail fast on an unusable store before anything connects
        if store.backend()?.requires_token() {
            store.require_token()?;
        }

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env: var("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: var("API_HOST").unwrap_or_else(default_host),
                port: var("API_PORT")
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("API_PORT"))?,
            },
            store,
            image_service: ImageServiceConfig {
                url: var("IMAGE_SERVICE_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .ok_or(ConfigError::MissingVar("IMAGE_SERVICE_URL"))?,
                timeout_secs: parsed("IMAGE_SERVICE_TIMEOUT_SECS")?
                    .unwrap_or_else(default_image_service_timeout),
                max_upload_size_mb: parsed("MAX_UPLOAD_SIZE_MB")?
                    .map_or_else(default_max_upload_size, |v| v as u32),
            },
            stream: StreamConfig {
                keepalive_secs: parsed("STREAM_KEEPALIVE_SECS")?
                    .unwrap_or_else(default_keepalive_secs),
                buffer: parsed("STREAM_BUFFER")?
                    .map_or_else(default_stream_buffer, |v| v.max(1) as usize),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parsed("RATE_LIMIT_REQUESTS_PER_SECOND")?
                    .map_or_else(default_requests_per_second, |v| v as u32),
                burst: parsed("RATE_LIMIT_BURST")?.map_or_else(default_burst, |v| v as u32),
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("API_PORT", "3000"),
        ("STORE_URL", "redis://localhost:6379"),
        ("STORE_TOKEN", "secret"),
        ("IMAGE_SERVICE_URL", "https://images.example.com/"),
    ];

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_loads_with_defaults() {
        let config = AppConfig::from_lookup(lookup(BASE)).unwrap();

        assert_eq!(config.app.name, "gallery-likes");
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.store.backend().unwrap(), StoreBackend::Redis);
        assert_eq!(config.store.channel, "like-updates");
        assert_eq!(config.image_service.url, "https://images.example.com");
        assert_eq!(config.image_service.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.stream.keepalive_secs, 15);
        assert_eq!(config.stream.buffer, 1024);
        assert!(config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_missing_store_url_is_fatal() {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "STORE_URL").collect();
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("STORE_URL")));
    }

    #[test]
    fn test_missing_token_is_fatal_for_remote_stores() {
        let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != "STORE_TOKEN").collect();
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("STORE_TOKEN")));
    }

    #[test]
    fn test_memory_store_needs_no_token() {
        let config = AppConfig::from_lookup(lookup(&[
            ("API_PORT", "3000"),
            ("STORE_URL", "memory://"),
            ("IMAGE_SERVICE_URL", "http://localhost:9000"),
        ]))
        .unwrap();
        assert_eq!(config.store.backend().unwrap(), StoreBackend::Memory);
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        assert!(StoreBackend::from_url("mysql://db").is_err());
        assert!(StoreBackend::from_url("no-scheme").is_err());
        assert_eq!(
            StoreBackend::from_url("postgresql://db").unwrap(),
            StoreBackend::Postgres
        );
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let mut vars = BASE.to_vec();
        vars.push(("STREAM_BUFFER", "lots"));
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("STREAM_BUFFER", _)));
    }

    #[test]
    fn test_cors_origins_are_split() {
        let mut vars = BASE.to_vec();
        vars.push(("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"));
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let config = AppConfig::from_lookup(lookup(BASE)).unwrap();
        let debug = format!("{:?}", config.store);
        assert!(!debug.contains("secret"));
    }
}
