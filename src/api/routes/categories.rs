//! Bill category routes.
//!
//! Categories can nest one level deep through `parent_id`. A category
//! with bills or child categories cannot be deleted.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::{MessageResponse, log_guard_violation, row_exists};
use crate::models::catalog::{BillCategoryPayload, BillCategoryRow};

const CATEGORY_COLUMNS: &str = "id, name, description, parent_id";

/// Create the categories router
pub fn categories_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

async fn fetch_category(pool: &SqlitePool, id: i64) -> Result<BillCategoryRow, ApiError> {
    let sql = format!(
        "SELECT {} FROM bill_categories WHERE id = ?",
        CATEGORY_COLUMNS
    );
    sqlx::query_as::<_, BillCategoryRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)
}

/// GET /categories - List bill categories ordered by name
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    responses(
        (status = 200, description = "Categories retrieved successfully", body = [BillCategoryRow]),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<BillCategoryRow>>, ApiError> {
    let sql = format!(
        "SELECT {} FROM bill_categories ORDER BY name",
        CATEGORY_COLUMNS
    );
    let rows = sqlx::query_as::<_, BillCategoryRow>(&sql)
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(rows))
}

/// GET /categories/{id} - Category detail
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category retrieved successfully", body = BillCategoryRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_category(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<BillCategoryRow>, ApiError> {
    Ok(Json(fetch_category(&state.pool, id).await?))
}

/// POST /categories - Create a category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    request_body = BillCategoryPayload,
    responses(
        (status = 201, description = "Category created", body = BillCategoryRow),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<BillCategoryPayload>,
) -> Result<(StatusCode, Json<BillCategoryRow>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    if let Some(parent_id) = payload.parent_id {
        if !row_exists(&state.pool, "bill_categories", parent_id).await? {
            return Err(ApiError::Validation("unknown parent category".to_string()));
        }
    }

    let result = sqlx::query(
        "INSERT INTO bill_categories (name, description, parent_id) VALUES (?, ?, ?)",
    )
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.parent_id)
    .execute(&state.pool)
    .await?;

    let row = fetch_category(&state.pool, result.last_insert_rowid()).await?;
    info!("category '{}' created by {}", row.name, auth.user.username);

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /categories/{id} - Update a category
#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    request_body = BillCategoryPayload,
    responses(
        (status = 200, description = "Category updated", body = BillCategoryRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(payload): Json<BillCategoryPayload>,
) -> Result<Json<BillCategoryRow>, ApiError> {
    let row = fetch_category(&state.pool, id).await?;
    payload.validate().map_err(ApiError::Validation)?;

    if let Some(parent_id) = payload.parent_id {
        if parent_id == row.id {
            return Err(ApiError::Validation(
                "category cannot be its own parent".to_string(),
            ));
        }
        if !row_exists(&state.pool, "bill_categories", parent_id).await? {
            return Err(ApiError::Validation("unknown parent category".to_string()));
        }
    }

    sqlx::query("UPDATE bill_categories SET name = ?, description = ?, parent_id = ? WHERE id = ?")
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.parent_id)
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    let updated = fetch_category(&state.pool, row.id).await?;
    info!(
        "category '{}' updated by {}",
        updated.name, auth.user.username
    );

    Ok(Json(updated))
}

/// DELETE /categories/{id} - Delete a category
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category has bills or child categories")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = fetch_category(&state.pool, id).await?;

    let bill_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills WHERE category_id = ?")
        .bind(row.id)
        .fetch_one(&state.pool)
        .await?;
    let child_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM bill_categories WHERE parent_id = ?")
            .bind(row.id)
            .fetch_one(&state.pool)
            .await?;

    if bill_count > 0 || child_count > 0 {
        warn!(
            "category '{}' has {} bills and {} children, delete rejected (user {})",
            row.name, bill_count, child_count, auth.user.username
        );
        log_guard_violation(
            &state,
            "category delete rejected: bills or subcategories attached",
            &row.id.to_string(),
            &auth,
        )
        .await;
        return Err(ApiError::Conflict(
            "category has bills or subcategories and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM bill_categories WHERE id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    info!("category '{}' deleted by {}", row.name, auth.user.username);

    Ok(Json(MessageResponse {
        message: format!("category '{}' deleted", row.name),
    }))
}
