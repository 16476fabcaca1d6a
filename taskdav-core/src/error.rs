//! Error types for taskdav.

use thiserror::Error;

/// Errors that can occur while translating or persisting tasks.
#[derive(Error, Debug)]
pub enum TaskDavError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Invalid recurrence rule: {0}")]
    Recurrence(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for taskdav operations.
pub type TaskDavResult<T> = Result<T, TaskDavError>;
