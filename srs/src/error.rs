use thiserror::Error;

#[derive(Debug, Error)]
pub enum SrsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Card not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to lock {0}")]
    Lock(&'static str),
}

pub type Result<T> = std::result::Result<T, SrsError>;

impl SrsError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SrsError::InvalidArgument(msg.into())
    }
}
