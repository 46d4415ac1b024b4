//! Unique identifiers for harvest sessions.
//!
//! `SessionId` provides type-safe identifiers for archived sessions,
//! preventing accidental misuse of string identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a harvest session.
///
/// Uses UUID v4 internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Length of the hyphenated textual form.
    pub const FULL_LEN: usize = 36;

    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get a short representation (first 8 characters).
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < Self::FULL_LEN {
            return Err(SessionIdError::ShortFormNotSupported);
        }

        let uuid = Uuid::parse_str(s).map_err(|_| SessionIdError::InvalidFormat(s.to_string()))?;
        Ok(Self(uuid))
    }
}

/// Error type for SessionId parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionIdError {
    #[error("invalid session ID format: {0}")]
    InvalidFormat(String),
    #[error("short session IDs must be resolved through the archive")]
    ShortFormNotSupported,
}
