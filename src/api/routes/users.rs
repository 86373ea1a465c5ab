//! User management routes (superuser only).
//!
//! Users carry department memberships; a non-superuser only sees
//! records of the departments assigned here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, put};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::row_exists;
use crate::models::user::{CreateUserRequest, UserResponse, UserRow};
use crate::services::password_service;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_superuser, is_active, created_at, updated_at";

/// Body for replacing a user's department memberships
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDepartmentsRequest {
    pub department_ids: Vec<i64>,
}

/// Create the users router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user))
        .route("/{id}/departments", put(update_user_departments))
}

async fn fetch_user(pool: &SqlitePool, id: i64) -> Result<UserRow, ApiError> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)
}

async fn user_department_ids(pool: &SqlitePool, user_id: i64) -> Result<Vec<i64>, ApiError> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT department_id FROM user_departments WHERE user_id = ? ORDER BY department_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// GET /users - List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser required")
    ),
    security(("session_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    auth.require_superuser()?;

    let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
    let rows = sqlx::query_as::<_, UserRow>(&sql)
        .fetch_all(&state.pool)
        .await?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        let departments = user_department_ids(&state.pool, row.id).await?;
        users.push(UserResponse::from_row(row, departments));
    }

    Ok(Json(users))
}

/// GET /users/{id} - User detail
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "User not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_superuser()?;

    let row = fetch_user(&state.pool, id).await?;
    let departments = user_department_ids(&state.pool, row.id).await?;

    Ok(Json(UserResponse::from_row(row, departments)))
}

/// POST /users - Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser required"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    auth.require_superuser()?;
    payload.validate().map_err(ApiError::Validation)?;

    let username = payload.username.trim().to_string();
    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(&username)
        .fetch_one(&state.pool)
        .await?;
    if taken {
        return Err(ApiError::Validation(format!(
            "username '{}' already exists",
            username
        )));
    }

    for department_id in &payload.department_ids {
        if !row_exists(&state.pool, "departments", *department_id).await? {
            return Err(ApiError::Validation(format!(
                "unknown department: {}",
                department_id
            )));
        }
    }

    let hash = password_service::hash_password(&payload.password)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {}", e)))?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, is_superuser, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&username)
    .bind(&payload.email)
    .bind(&hash)
    .bind(payload.is_superuser)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let user_id = result.last_insert_rowid();
    for department_id in &payload.department_ids {
        sqlx::query("INSERT INTO user_departments (user_id, department_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(department_id)
            .execute(&state.pool)
            .await?;
    }

    let row = fetch_user(&state.pool, user_id).await?;
    let departments = user_department_ids(&state.pool, user_id).await?;
    info!("user '{}' created by {}", row.username, auth.user.username);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_row(row, departments)),
    ))
}

/// PUT /users/{id}/departments - Replace a user's departments
#[utoipa::path(
    put,
    path = "/users/{id}/departments",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateDepartmentsRequest,
    responses(
        (status = 200, description = "Departments updated", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superuser required"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_user_departments(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDepartmentsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_superuser()?;

    let row = fetch_user(&state.pool, id).await?;

    for department_id in &payload.department_ids {
        if !row_exists(&state.pool, "departments", *department_id).await? {
            return Err(ApiError::Validation(format!(
                "unknown department: {}",
                department_id
            )));
        }
    }

    sqlx::query("DELETE FROM user_departments WHERE user_id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;
    for department_id in &payload.department_ids {
        sqlx::query("INSERT INTO user_departments (user_id, department_id) VALUES (?, ?)")
            .bind(row.id)
            .bind(department_id)
            .execute(&state.pool)
            .await?;
    }

    let departments = user_department_ids(&state.pool, row.id).await?;
    info!(
        "departments of user '{}' updated by {}",
        row.username, auth.user.username
    );

    Ok(Json(UserResponse::from_row(row, departments)))
}
