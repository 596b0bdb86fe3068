use serde::Serialize;
use thiserror::Error;

/// Failures of the persisted key-value store.
///
/// These never reach the user: callers log them and carry on with
/// whatever in-memory state they already have.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum StoreError {
    #[error("File system error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
