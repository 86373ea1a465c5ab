//! Activity log middleware.
//!
//! Records every state-changing request (anything but GET/HEAD/OPTIONS)
//! to the activity_log table before the handler runs: matched route,
//! method, path, client ip and the authenticated username when a valid
//! session accompanies the request. Logging failures never fail the
//! request.

use axum::extract::{MatchedPath, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::activity::{ActivityLevel, NewActivityEntry};
use crate::routes::app_state::AppState;
use crate::routes::auth_context::session_token;

/// Axum middleware recording mutating requests.
pub async fn record_activity(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let action = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let ip_address = client_ip(request.headers());
    let username = resolve_username(&state, request.headers()).await;

    let entry = NewActivityEntry {
        level: ActivityLevel::Info,
        action: format!("{} {}", method, action),
        method: Some(method.to_string()),
        path: Some(path),
        ip_address,
        username,
        extra_data: None,
    };

    if let Err(e) = record_entry(&state.pool, entry).await {
        tracing::error!("failed to write activity log entry: {}", e);
    }

    next.run(request).await
}

/// Write one entry to the activity log.
///
/// Also used directly by handlers to record guard violations as
/// WARNING entries.
pub async fn record_entry(pool: &SqlitePool, entry: NewActivityEntry) -> Result<(), sqlx::Error> {
    let extra = entry
        .extra_data
        .as_ref()
        .map(|v| v.to_string());

    sqlx::query(
        r#"
        INSERT INTO activity_log (level, action, method, path, ip_address, username, extra_data, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.level.as_str())
    .bind(&entry.action)
    .bind(&entry.method)
    .bind(&entry.path)
    .bind(&entry.ip_address)
    .bind(&entry.username)
    .bind(extra)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Best-effort client address from proxy headers.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(|ip| ip.trim().to_string())
}

/// Resolve the username of the session accompanying the request, if any.
async fn resolve_username(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = session_token(headers)?;
    let session = state.sessions.get_session(token).await.ok().flatten()?;

    sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = ?")
        .bind(session.user_id)
        .fetch_optional(&state.pool)
        .await
        .ok()
        .flatten()
}
