//! Error types for rundown-engine
//!
//! Every error is returned synchronously from the operation that detected it.
//! The engine performs no I/O, so nothing here is transient or retried.

use thiserror::Error;

/// Main error type for rundown-engine
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown entry id or cue
    #[error("Not found: {0}")]
    NotFound(String),

    /// Position or pagination bounds violated, or a stale position supplied
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Malformed entry fields or an operation that does not fit the entry kind
    #[error("Validation error: {0}")]
    Validation(String),

    /// Playback transition not valid for the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Errors from shared code (configuration, boundary validation)
    #[error(transparent)]
    Common(#[from] rundown_common::Error),
}

/// Convenience Result type using rundown-engine Error
pub type Result<T> = std::result::Result<T, Error>;
