//! Error types for boards-mcp.

use thiserror::Error;

/// Main error type for boards operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned a non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response payload did not have the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Tool arguments failed validation
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl Error {
    /// Build an error from a non-success HTTP status and its body text.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if it came from an API response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API answered 404 Not Found.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias for boards operations.
pub type Result<T> = std::result::Result<T, Error>;
