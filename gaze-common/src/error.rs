//! Common error types for gaze-review

use thiserror::Error;

/// Common result type for gaze-review operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the backend crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("{0}")]
    NotFound(String),
}
