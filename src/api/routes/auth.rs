//! Authentication routes: session login, logout and status.
//!
//! Login hands out an opaque session id stored in the database. The
//! endpoint is rate limited per username to slow down credential
//! guessing.

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::MessageResponse;
use crate::models::user::UserRow;
use crate::services::password_service;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub session_id: String,
    pub username: String,
    pub is_superuser: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub username: String,
    pub is_superuser: bool,
    pub department_ids: Vec<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Create the auth router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/status", get(get_auth_status))
}

/// POST /auth/login - Authenticate and open a session
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".to_string(),
        ));
    }

    if state.login_limiter.check_key(&username).is_err() {
        warn!("login rate limit hit for '{}'", username);
        return Err(ApiError::RateLimited);
    }

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password_hash, is_superuser, is_active, created_at, updated_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(&username)
    .fetch_optional(&state.pool)
    .await?;

    let Some(user) = user else {
        warn!("login failed for unknown user '{}'", username);
        return Err(ApiError::Unauthorized);
    };

    if !password_service::verify_password(&payload.password, &user.password_hash) {
        warn!("login failed for user '{}': bad password", username);
        return Err(ApiError::Unauthorized);
    }

    if !user.is_active {
        warn!("login rejected for deactivated user '{}'", username);
        return Err(ApiError::Unauthorized);
    }

    let session = state.sessions.create_session(user.id).await?;
    info!("user '{}' logged in", user.username);

    Ok(Json(LoginResponse {
        session_id: session.id,
        username: user.username,
        is_superuser: user.is_superuser,
        expires_at: session.expires_at,
    }))
}

/// POST /auth/logout - Revoke the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<MessageResponse>, ApiError> {
    state.sessions.revoke(&auth.session_id).await?;
    info!("user '{}' logged out", auth.user.username);

    Ok(Json(MessageResponse {
        message: "logged out".to_string(),
    }))
}

/// GET /auth/status - Current session and user info
#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "Auth",
    responses(
        (status = 200, description = "Session status", body = AuthStatusResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn get_auth_status(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<AuthStatusResponse>, ApiError> {
    let session = state.sessions.get_session(&auth.session_id).await?;

    Ok(Json(AuthStatusResponse {
        authenticated: true,
        username: auth.user.username,
        is_superuser: auth.user.is_superuser,
        department_ids: auth.user.department_ids,
        expires_at: session.map(|s| s.expires_at),
    }))
}
