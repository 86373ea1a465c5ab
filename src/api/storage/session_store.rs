//! Database-backed session store.
//!
//! Sessions are opaque uuid v4 tokens handed out at login. A session
//! is valid until its expiry timestamp; a background task purges
//! expired rows.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Sessions live for seven days from login.
const SESSION_TTL_DAYS: i64 = 7;

/// A stored session row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Database-backed session store.
pub struct DbSessionStore {
    pool: SqlitePool,
}

impl DbSessionStore {
    /// Create a new database session store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a session for a user and return it.
    pub async fn create_session(&self, user_id: i64) -> Result<SessionRecord, sqlx::Error> {
        let now = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, last_activity, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.last_activity)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get a live session by id. Expired sessions are treated as absent.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, sqlx::Error> {
        sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT id, user_id, created_at, last_activity, expires_at
            FROM sessions
            WHERE id = ? AND expires_at > ?
            "#,
        )
        .bind(session_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    /// Update the session activity timestamp.
    pub async fn touch(&self, session_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET last_activity = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Revoke a session (logout).
    pub async fn revoke(&self, session_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete expired sessions, returning how many rows went away.
    pub async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Background task that cleans up expired sessions once an hour.
pub async fn start_session_cleanup_task(pool: SqlitePool) {
    let store = DbSessionStore::new(pool);
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));

    loop {
        interval.tick().await;

        match store.purge_expired().await {
            Ok(0) => {}
            Ok(n) => tracing::info!("purged {} expired sessions", n),
            Err(e) => tracing::error!("failed to cleanup expired sessions: {}", e),
        }
    }
}
