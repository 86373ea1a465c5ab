//! Department routes.
//!
//! Lists are scoped to the caller's departments (superusers see all).
//! A department with budgets or bills cannot be deleted.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::{MessageResponse, log_guard_violation};
use crate::models::catalog::{DepartmentPayload, DepartmentRow};

const DEPARTMENT_COLUMNS: &str = "id, name, created_at, updated_at";

/// Department list response with overall record counts
#[derive(Serialize, ToSchema)]
pub struct DepartmentListResponse {
    pub departments: Vec<DepartmentRow>,
    pub total_budgets: i64,
    pub total_bills: i64,
}

/// Department detail with its own totals
#[derive(Serialize, ToSchema)]
pub struct DepartmentDetailResponse {
    pub department: DepartmentRow,
    pub budgets_count: i64,
    pub bills_count: i64,
    pub budgets_total: i64,
    pub bills_total: i64,
    pub balance: i64,
}

/// Create the departments router
pub fn departments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route(
            "/{id}",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}

async fn fetch_department(pool: &SqlitePool, id: i64) -> Result<DepartmentRow, ApiError> {
    let sql = format!("SELECT {} FROM departments WHERE id = ?", DEPARTMENT_COLUMNS);
    sqlx::query_as::<_, DepartmentRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Departments visible to the caller.
pub(crate) async fn visible_departments(
    pool: &SqlitePool,
    auth: &AuthContext,
) -> Result<Vec<DepartmentRow>, ApiError> {
    if auth.user.is_superuser {
        let sql = format!("SELECT {} FROM departments ORDER BY id", DEPARTMENT_COLUMNS);
        return Ok(sqlx::query_as::<_, DepartmentRow>(&sql)
            .fetch_all(pool)
            .await?);
    }

    let sql = format!(
        r#"
        SELECT {} FROM departments
        WHERE id IN (SELECT department_id FROM user_departments WHERE user_id = ?)
        ORDER BY id
        "#,
        DEPARTMENT_COLUMNS
    );
    Ok(sqlx::query_as::<_, DepartmentRow>(&sql)
        .bind(auth.user.id)
        .fetch_all(pool)
        .await?)
}

/// GET /departments - Visible departments with overall counts
#[utoipa::path(
    get,
    path = "/departments",
    tag = "Departments",
    responses(
        (status = 200, description = "Departments retrieved successfully", body = DepartmentListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn list_departments(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<DepartmentListResponse>, ApiError> {
    let departments = visible_departments(&state.pool, &auth).await?;

    let total_budgets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM budgets")
        .fetch_one(&state.pool)
        .await?;
    let total_bills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(DepartmentListResponse {
        departments,
        total_budgets,
        total_bills,
    }))
}

/// GET /departments/{id} - Department detail with totals
#[utoipa::path(
    get,
    path = "/departments/{id}",
    tag = "Departments",
    params(("id" = i64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department retrieved successfully", body = DepartmentDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Department not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_department(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<DepartmentDetailResponse>, ApiError> {
    let department = fetch_department(&state.pool, id).await?;

    let (budgets_total, budgets_count): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_amount), 0), COUNT(*) FROM budgets WHERE department_id = ?",
    )
    .bind(department.id)
    .fetch_one(&state.pool)
    .await?;
    let (bills_total, bills_count): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_amount), 0), COUNT(*) FROM bills WHERE department_id = ?",
    )
    .bind(department.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(DepartmentDetailResponse {
        department,
        budgets_count,
        bills_count,
        budgets_total,
        bills_total,
        balance: budgets_total - bills_total,
    }))
}

/// POST /departments - Create a department
#[utoipa::path(
    post,
    path = "/departments",
    tag = "Departments",
    request_body = DepartmentPayload,
    responses(
        (status = 201, description = "Department created", body = DepartmentRow),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_department(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<DepartmentPayload>,
) -> Result<(StatusCode, Json<DepartmentRow>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO departments (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(payload.name.trim())
            .bind(now)
            .bind(now)
            .execute(&state.pool)
            .await?;

    let row = fetch_department(&state.pool, result.last_insert_rowid()).await?;
    info!("department '{}' created by {}", row.name, auth.user.username);

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /departments/{id} - Update a department
#[utoipa::path(
    put,
    path = "/departments/{id}",
    tag = "Departments",
    params(("id" = i64, Path, description = "Department id")),
    request_body = DepartmentPayload,
    responses(
        (status = 200, description = "Department updated", body = DepartmentRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Department not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_department(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<Json<DepartmentRow>, ApiError> {
    let row = fetch_department(&state.pool, id).await?;
    payload.validate().map_err(ApiError::Validation)?;

    sqlx::query("UPDATE departments SET name = ?, updated_at = ? WHERE id = ?")
        .bind(payload.name.trim())
        .bind(Utc::now())
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    let updated = fetch_department(&state.pool, row.id).await?;
    info!(
        "department '{}' updated by {}",
        updated.name, auth.user.username
    );

    Ok(Json(updated))
}

/// DELETE /departments/{id} - Delete a department
#[utoipa::path(
    delete,
    path = "/departments/{id}",
    tag = "Departments",
    params(("id" = i64, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department has budgets or bills")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_department(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = fetch_department(&state.pool, id).await?;

    let budget_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM budgets WHERE department_id = ?")
            .bind(row.id)
            .fetch_one(&state.pool)
            .await?;
    let bill_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills WHERE department_id = ?")
        .bind(row.id)
        .fetch_one(&state.pool)
        .await?;

    if budget_count > 0 || bill_count > 0 {
        warn!(
            "department '{}' has {} budgets and {} bills, delete rejected (user {})",
            row.name, budget_count, bill_count, auth.user.username
        );
        log_guard_violation(
            &state,
            "department delete rejected: budgets or bills attached",
            &row.id.to_string(),
            &auth,
        )
        .await;
        return Err(ApiError::Conflict(
            "department has budgets or bills and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    info!("department '{}' deleted by {}", row.name, auth.user.username);

    Ok(Json(MessageResponse {
        message: format!("department '{}' deleted", row.name),
    }))
}
