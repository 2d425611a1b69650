//! Error types for the session layer

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by the session store and the session context
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Durable storage could not be read or written
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted identity is not valid JSON
    #[error("Session storage is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    /// The session context was dropped while a caller was waiting on it
    #[error("Session context closed")]
    Closed,
}
