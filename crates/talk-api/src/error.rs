//! Error types for talk-api

use crate::types::TalkId;
use thiserror::Error;

/// Result type alias using talk-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// A terminated line of the reply stream could not be decoded
    #[error("Malformed reply line {line:?}: {reason}")]
    Decode { line: String, reason: String },

    /// The reply stream ended in the middle of an object
    #[error("Reply stream ended inside an object: {0:?}")]
    Truncated(String),

    /// No talk with this id exists
    #[error("Talk not found: {0}")]
    TalkNotFound(TalkId),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error for a terminated line
    pub fn decode(line: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            line: line.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error came from a non-success backend status
    pub fn is_status(&self) -> bool {
        match self {
            Error::Status { .. } => true,
            Error::Http(e) => e.status().is_some(),
            _ => false,
        }
    }

    /// Check if this error is a violation of the reply stream framing
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Decode { .. } | Error::Truncated(_))
    }
}
