//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),
    /// Database query error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Filesystem error while reading or writing an attachment
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Rejected attachment file name
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}
