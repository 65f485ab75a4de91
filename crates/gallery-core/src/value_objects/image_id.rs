//! Image ID - opaque identifier issued by the external image service
//!
//! The like store only ever references images by this id. Ids travel in
//! comma-separated query strings and in Redis key names, so commas and
//! whitespace are rejected.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque image identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(String);

impl ImageId {
    /// Maximum accepted length in bytes
    pub const MAX_LEN: usize = 128;

    /// Create a validated image id
    pub fn new(raw: impl Into<String>) -> Result<Self, IdParseError> {
        let raw = raw.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(IdParseError::Empty);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(IdParseError::TooLong { max: Self::MAX_LEN });
        }
        if trimmed.chars().any(|c| c == ',' || c.is_whitespace() || c.is_control()) {
            return Err(IdParseError::InvalidCharacter);
        }

        if trimmed.len() == raw.len() {
            Ok(Self(raw))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Borrow the raw id
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw id
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Parse a comma-separated id list of at most `max` distinct ids.
    ///
    /// Empty segments are skipped and duplicates keep their first position.
    /// Parsing stops at the first id past `max`.
    pub fn parse_csv(csv: &str, max: usize) -> Result<Vec<Self>, IdParseError> {
        let mut ids: Vec<Self> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for segment in csv.split(',') {
            let segment = segment.trim();
            if segment.is_empty() || seen.contains(segment) {
                continue;
            }
            if ids.len() == max {
                return Err(IdParseError::TooMany { max });
            }
            ids.push(Self::new(segment)?);
            seen.insert(segment);
        }
        Ok(ids)
    }

    /// Join ids back into the comma-separated wire form
    pub fn join_csv(ids: &[Self]) -> String {
        ids.iter().map(Self::as_str).collect::<Vec<_>>().join(",")
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImageId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ImageId {
    type Error = IdParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error when parsing an identifier or display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("value is empty")]
    Empty,

    #[error("value exceeds {max} characters")]
    TooLong { max: usize },

    #[error("value contains an invalid character")]
    InvalidCharacter,

    #[error("more than {max} values")]
    TooMany { max: usize },
}
