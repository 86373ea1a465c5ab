//! Application state.
//!
//! Holds the shared handles every route needs: the SQLite pool, the
//! session store, the attachment store and the login rate limiter.

use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::middleware::rate_limit::{LoginRateLimiter, create_login_limiter};
use crate::storage::{AttachmentStore, DbSessionStore};

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub pool: SqlitePool,
    /// Database-backed session store
    pub sessions: Arc<DbSessionStore>,
    /// On-disk attachment store
    pub attachments: Arc<AttachmentStore>,
    /// Keyed limiter for the login endpoint
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    /// Create the application state over an open pool, storing
    /// attachments under `upload_root`.
    pub fn new(pool: SqlitePool, upload_root: PathBuf) -> Self {
        Self {
            sessions: Arc::new(DbSessionStore::new(pool.clone())),
            attachments: Arc::new(AttachmentStore::new(upload_root)),
            login_limiter: create_login_limiter(),
            pool,
        }
    }
}
