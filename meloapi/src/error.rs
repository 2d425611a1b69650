//! Error types for the Melo REST client

use thiserror::Error;

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised while talking to the backend
///
/// They never reach view code directly: accessors turn them into
/// [`Fetched::Fallback`](crate::Fetched::Fallback).
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure (connection, timeout, TLS, body read)
    #[error("transport failure: {0}")]
    Http(#[from] reqwest::Error),

    /// 401 / 403
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 404
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-2xx status
    #[error("backend answered {code}: {message}")]
    Status { code: u16, message: String },

    /// Response body did not have the expected shape
    #[error("unexpected response body: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The session context went away while the call waited on it
    #[error("session closed before the request could be sent")]
    SessionClosed,

    #[error("configuration: {0}")]
    Config(#[from] anyhow::Error),
}

/// Coarse classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Status,
    Decode,
    Session,
    Config,
}

impl ApiError {
    /// Build an error from a non-2xx HTTP status and its body
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            _ => Self::Status {
                code,
                message: message.into(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http(e) if e.is_decode() => ErrorKind::Decode,
            ApiError::Http(_) => ErrorKind::Transport,
            ApiError::Unauthorized(_) | ApiError::NotFound(_) | ApiError::Status { .. } => {
                ErrorKind::Status
            }
            ApiError::JsonParse(_) => ErrorKind::Decode,
            ApiError::SessionClosed => ErrorKind::Session,
            ApiError::InvalidUrl(_) | ApiError::Config(_) => ErrorKind::Config,
        }
    }
}
