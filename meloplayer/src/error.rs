use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// The media element rejected a command; raised by `MediaElement` implementations
    #[error("Media element error during {operation}: {message}")]
    Element { operation: String, message: String },

    #[error("Invalid media source: {0}")]
    InvalidSource(String),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
