//! Storage module for the API.
//!
//! Provides the SQLite connection pool, the database-backed session
//! store, and the on-disk attachment store.

pub mod attachment_store;
pub mod error;
pub mod session_store;

pub use attachment_store::AttachmentStore;
pub use error::StorageError;
pub use session_store::DbSessionStore;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Open the SQLite pool for the given database URL.
///
/// The database file is created when missing and foreign key
/// enforcement is switched on for every connection (the referential
/// delete rules rely on it).
pub async fn connect(database_url: &str) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(format!("invalid database url: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(format!("failed to connect to database: {}", e)))
}
