//! Crate-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Invalid setting `{name}`: {value}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("Too many clients: limit is {0}")]
    TooManyClients(usize),

    #[error("Broadcaster is closed")]
    Closed,

    #[error("Artifact mismatch: expected {expected}, got {actual}")]
    ArtifactMismatch { expected: String, actual: String },

    #[error("Task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Encode(e.to_string())
    }
}
