//! Common error types for the rundown workspace

use thiserror::Error;

/// Common result type for rundown-common operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the engine and its collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input rejected at the boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
