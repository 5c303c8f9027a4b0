//! Common error types for shinkan

use thiserror::Error;

/// Common result type for shinkan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the shinkan crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed normalized source record, rejected at the intake boundary
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Queued record carries no identifier for its declared anchor service
    #[error("Missing anchor id for service {0}")]
    MissingAnchor(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error only invalidates a single queued record.
    ///
    /// Recoverable errors are logged and the remaining queue keeps
    /// processing; anything else aborts the whole pass.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MissingAnchor(_) | Error::InvalidRecord(_))
    }
}
