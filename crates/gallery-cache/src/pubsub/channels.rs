//! Pub/Sub channel definitions.

/// Default channel carrying like events
pub const LIKES_CHANNEL: &str = "like-updates";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// The shared like event channel
    Likes,
    /// Custom channel name
    Custom(String),
}

impl PubSubChannel {
    /// Create the like event channel
    #[must_use]
    pub fn likes() -> Self {
        Self::Likes
    }

    /// Create a custom channel
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Likes => LIKES_CHANNEL.to_string(),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == LIKES_CHANNEL {
            Self::Likes
        } else {
            Self::Custom(name.to_string())
        }
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
