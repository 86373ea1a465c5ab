//! Authentication context.
//!
//! Extracts the authenticated user from the session token carried in
//! the `Authorization: Bearer` header (or `x-session-id` fallback) and
//! loads the department memberships that drive record visibility.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use sqlx::{QueryBuilder, Sqlite};

use super::app_state::AppState;
use super::error::ApiError;
use crate::models::user::{CurrentUser, UserRow};

/// Authentication context extracted from a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: CurrentUser,
    pub session_id: String,
}

impl AuthContext {
    /// Reject non-superusers.
    pub fn require_superuser(&self) -> Result<(), ApiError> {
        if self.user.is_superuser {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(|| {
            tracing::warn!("no session token provided");
            ApiError::Unauthorized
        })?;

        let session = state
            .sessions
            .get_session(token)
            .await?
            .ok_or_else(|| {
                tracing::warn!("unknown or expired session");
                ApiError::Unauthorized
            })?;

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, is_superuser, is_active, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(session.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;

        if !user.is_active {
            tracing::warn!("session for deactivated user '{}'", user.username);
            return Err(ApiError::Unauthorized);
        }

        let department_ids = sqlx::query_scalar::<_, i64>(
            "SELECT department_id FROM user_departments WHERE user_id = ? ORDER BY department_id",
        )
        .bind(user.id)
        .fetch_all(&state.pool)
        .await?;

        if let Err(e) = state.sessions.touch(token).await {
            tracing::warn!("failed to update session activity: {}", e);
        }

        Ok(AuthContext {
            user: CurrentUser {
                id: user.id,
                username: user.username,
                is_superuser: user.is_superuser,
                department_ids,
            },
            session_id: token.to_string(),
        })
    }
}

/// Session token from the request headers: `Authorization: Bearer ...`
/// preferred, `x-session-id` fallback.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth_header) = headers.get("authorization").and_then(|h| h.to_str().ok()) {
        return extract_bearer_token(auth_header);
    }
    headers.get("x-session-id").and_then(|h| h.to_str().ok())
}

/// Token part of a `Bearer ...` authorization header.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Append the department visibility restriction to a query.
///
/// `scope` is `None` for superusers (no restriction). An empty scope
/// matches nothing: a user without departments sees no records.
pub fn push_department_scope(builder: &mut QueryBuilder<'_, Sqlite>, scope: Option<&[i64]>) {
    let Some(ids) = scope else {
        return;
    };

    if ids.is_empty() {
        builder.push(" AND 1 = 0");
        return;
    }

    builder.push(" AND department_id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    builder.push(")");
}
