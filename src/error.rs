//! Error types for healthwatch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed change-feed entry seq {seq}: {reason}")]
    MalformedEntry { seq: i64, reason: String },

    #[error("delivery to {channel} channel failed: {reason}")]
    Transport { channel: Channel, reason: String },

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Which delivery channel a transport error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Primary,
    Secondary,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Primary => write!(f, "primary"),
            Channel::Secondary => write!(f, "secondary"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
