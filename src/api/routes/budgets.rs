//! Budget routes.
//!
//! CRUD over budgets plus their attachments. Budgets saved with a
//! closing status become non-editable; closed budgets reject update,
//! delete and attachment mutation. A budget with bills attached cannot
//! be deleted.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Json, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, SqlitePool};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::app_state::AppState;
use super::attachments::{self, BUDGET_FILES};
use super::auth_context::{AuthContext, push_department_scope};
use super::error::ApiError;
use super::{MessageResponse, log_guard_violation, row_exists};
use crate::models::attachment::AttachmentResponse;
use crate::models::budget::{BudgetPayload, BudgetResponse, BudgetRow};

pub(crate) const BUDGET_COLUMNS: &str = "id, title, description, total_amount, identifier, \
     due_date, enabled, editable, status_id, type_id, currency_id, department_id, \
     created_at, updated_at";

/// Query parameters for the budget list
#[derive(Deserialize, IntoParams)]
pub struct BudgetListParams {
    /// Limit number of results (default: 10)
    #[param(default = 10)]
    limit: Option<i64>,
    /// Offset for pagination (default: 0)
    #[param(default = 0)]
    offset: Option<i64>,
}

/// Budget list response
#[derive(Serialize, ToSchema)]
pub struct BudgetListResponse {
    pub items: Vec<BudgetResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Budget detail response with attachments
#[derive(Serialize, ToSchema)]
pub struct BudgetDetailResponse {
    pub budget: BudgetResponse,
    pub files: Vec<AttachmentResponse>,
}

/// Upload response
#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub files: Vec<AttachmentResponse>,
}

/// Create the budgets router
pub fn budgets_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_budgets).post(create_budget))
        .route(
            "/{identifier}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route(
            "/{identifier}/files",
            get(list_budget_files).post(upload_budget_files),
        )
        .route(
            "/files/{file_id}",
            get(download_budget_file).delete(delete_budget_file),
        )
}

/// Fetch a budget by its public identifier.
pub(crate) async fn fetch_budget(pool: &SqlitePool, identifier: &str) -> Result<BudgetRow, ApiError> {
    let sql = format!("SELECT {} FROM budgets WHERE identifier = ?", BUDGET_COLUMNS);
    sqlx::query_as::<_, BudgetRow>(&sql)
        .bind(identifier)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Whether the given status closes its records for editing.
pub(crate) async fn status_closes_records(
    pool: &SqlitePool,
    status_id: Option<i64>,
) -> Result<bool, ApiError> {
    let Some(id) = status_id else {
        return Ok(false);
    };

    let closes = sqlx::query_scalar::<_, bool>(
        "SELECT closes_records FROM transaction_statuses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(closes.unwrap_or(false))
}

/// The status new records default to when none is given: the pending
/// status when present, otherwise the lowest id.
pub(crate) async fn default_status_id(pool: &SqlitePool) -> Result<Option<i64>, ApiError> {
    let pending = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM transaction_statuses WHERE name = 'En espera' LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    if pending.is_some() {
        return Ok(pending);
    }

    Ok(
        sqlx::query_scalar::<_, i64>("SELECT id FROM transaction_statuses ORDER BY id LIMIT 1")
            .fetch_optional(pool)
            .await?,
    )
}

async fn check_budget_refs(pool: &SqlitePool, payload: &BudgetPayload) -> Result<(), ApiError> {
    if !row_exists(pool, "transaction_types", payload.type_id).await? {
        return Err(ApiError::Validation("unknown transaction type".to_string()));
    }
    if !row_exists(pool, "currencies", payload.currency_id).await? {
        return Err(ApiError::Validation("unknown currency".to_string()));
    }
    if let Some(id) = payload.status_id {
        if !row_exists(pool, "transaction_statuses", id).await? {
            return Err(ApiError::Validation(
                "unknown transaction status".to_string(),
            ));
        }
    }
    if let Some(id) = payload.department_id {
        if !row_exists(pool, "departments", id).await? {
            return Err(ApiError::Validation("unknown department".to_string()));
        }
    }
    Ok(())
}

/// GET /budgets - List visible budgets, newest first
#[utoipa::path(
    get,
    path = "/budgets",
    tag = "Budgets",
    params(BudgetListParams),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = BudgetListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn list_budgets(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<BudgetListParams>,
) -> Result<Json<BudgetListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);
    let scope = auth.user.department_scope();

    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM budgets WHERE 1 = 1");
    push_department_scope(&mut count_builder, scope);
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(&state.pool)
        .await?;

    let mut builder =
        QueryBuilder::new(format!("SELECT {} FROM budgets WHERE 1 = 1", BUDGET_COLUMNS));
    push_department_scope(&mut builder, scope);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows: Vec<BudgetRow> = builder.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(BudgetListResponse {
        items: rows.into_iter().map(BudgetResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// POST /budgets - Create a budget
#[utoipa::path(
    post,
    path = "/budgets",
    tag = "Budgets",
    request_body = BudgetPayload,
    responses(
        (status = 201, description = "Budget created", body = BudgetResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_budget(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<BudgetPayload>,
) -> Result<(StatusCode, Json<BudgetResponse>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;
    check_budget_refs(&state.pool, &payload).await?;

    let status_id = match payload.status_id {
        Some(id) => Some(id),
        None => default_status_id(&state.pool).await?,
    };
    let editable = !status_closes_records(&state.pool, status_id).await?;
    let identifier = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO budgets
            (title, description, total_amount, identifier, due_date, enabled, editable,
             status_id, type_id, currency_id, department_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.total_amount)
    .bind(&identifier)
    .bind(payload.due_date)
    .bind(editable)
    .bind(status_id)
    .bind(payload.type_id)
    .bind(payload.currency_id)
    .bind(payload.department_id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let row = fetch_budget(&state.pool, &identifier).await?;
    info!("budget '{}' created by {}", row.title, auth.user.username);

    Ok((StatusCode::CREATED, Json(BudgetResponse::from(row))))
}

/// GET /budgets/{identifier} - Budget detail with attachments
#[utoipa::path(
    get,
    path = "/budgets/{identifier}",
    tag = "Budgets",
    params(("identifier" = Uuid, Path, description = "Budget identifier")),
    responses(
        (status = 200, description = "Budget retrieved successfully", body = BudgetDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Budget not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_budget(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(identifier): Path<Uuid>,
) -> Result<Json<BudgetDetailResponse>, ApiError> {
    let row = fetch_budget(&state.pool, &identifier.to_string()).await?;
    let files = attachments::list_files(&state, &BUDGET_FILES, row.id).await?;

    Ok(Json(BudgetDetailResponse {
        budget: BudgetResponse::from(row),
        files,
    }))
}

/// PUT /budgets/{identifier} - Update a budget
#[utoipa::path(
    put,
    path = "/budgets/{identifier}",
    tag = "Budgets",
    params(("identifier" = Uuid, Path, description = "Budget identifier")),
    request_body = BudgetPayload,
    responses(
        (status = 200, description = "Budget updated", body = BudgetResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Budget is closed for editing"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_budget(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(identifier): Path<Uuid>,
    Json(payload): Json<BudgetPayload>,
) -> Result<Json<BudgetResponse>, ApiError> {
    let row = fetch_budget(&state.pool, &identifier.to_string()).await?;

    if !row.editable {
        warn!(
            "budget '{}' ({}) is closed and cannot be edited (user {})",
            row.title, row.identifier, auth.user.username
        );
        log_guard_violation(
            &state,
            "budget update rejected: closed for editing",
            &row.identifier,
            &auth,
        )
        .await;
        return Err(ApiError::Conflict("budget is closed for editing".to_string()));
    }

    payload.validate().map_err(ApiError::Validation)?;
    check_budget_refs(&state.pool, &payload).await?;

    let editable = !status_closes_records(&state.pool, payload.status_id).await?;

    sqlx::query(
        r#"
        UPDATE budgets
        SET title = ?, description = ?, total_amount = ?, due_date = ?, status_id = ?,
            type_id = ?, currency_id = ?, department_id = ?, editable = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.total_amount)
    .bind(payload.due_date)
    .bind(payload.status_id)
    .bind(payload.type_id)
    .bind(payload.currency_id)
    .bind(payload.department_id)
    .bind(editable)
    .bind(Utc::now())
    .bind(row.id)
    .execute(&state.pool)
    .await?;

    let updated = fetch_budget(&state.pool, &row.identifier).await?;
    info!("budget '{}' updated by {}", updated.title, auth.user.username);

    Ok(Json(BudgetResponse::from(updated)))
}

/// DELETE /budgets/{identifier} - Delete a budget
#[utoipa::path(
    delete,
    path = "/budgets/{identifier}",
    tag = "Budgets",
    params(("identifier" = Uuid, Path, description = "Budget identifier")),
    responses(
        (status = 200, description = "Budget deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Budget is closed or has bills attached")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_budget(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(identifier): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = fetch_budget(&state.pool, &identifier.to_string()).await?;

    if !row.editable {
        warn!(
            "budget '{}' ({}) is closed and cannot be deleted (user {})",
            row.title, row.identifier, auth.user.username
        );
        log_guard_violation(
            &state,
            "budget delete rejected: closed for editing",
            &row.identifier,
            &auth,
        )
        .await;
        return Err(ApiError::Conflict(
            "budget is closed and cannot be deleted".to_string(),
        ));
    }

    let bill_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills WHERE budget_id = ?")
        .bind(row.id)
        .fetch_one(&state.pool)
        .await?;

    if bill_count > 0 {
        warn!(
            "budget '{}' ({}) has {} bills attached and cannot be deleted (user {})",
            row.title, row.identifier, bill_count, auth.user.username
        );
        log_guard_violation(
            &state,
            "budget delete rejected: bills attached",
            &row.identifier,
            &auth,
        )
        .await;
        return Err(ApiError::Conflict(
            "budget has bills attached and cannot be deleted".to_string(),
        ));
    }

    attachments::remove_record_files(&state, &BUDGET_FILES, row.id).await?;

    sqlx::query("DELETE FROM budgets WHERE id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    info!("budget '{}' deleted by {}", row.title, auth.user.username);

    Ok(Json(MessageResponse {
        message: format!("budget '{}' deleted", row.title),
    }))
}

/// GET /budgets/{identifier}/files - List budget attachments
#[utoipa::path(
    get,
    path = "/budgets/{identifier}/files",
    tag = "Budgets",
    params(("identifier" = Uuid, Path, description = "Budget identifier")),
    responses(
        (status = 200, description = "Attachments retrieved successfully", body = UploadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Budget not found")
    ),
    security(("session_auth" = []))
)]
pub async fn list_budget_files(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(identifier): Path<Uuid>,
) -> Result<Json<UploadResponse>, ApiError> {
    let row = fetch_budget(&state.pool, &identifier.to_string()).await?;
    let files = attachments::list_files(&state, &BUDGET_FILES, row.id).await?;

    Ok(Json(UploadResponse { files }))
}

/// POST /budgets/{identifier}/files - Attach files to a budget
#[utoipa::path(
    post,
    path = "/budgets/{identifier}/files",
    tag = "Budgets",
    params(("identifier" = Uuid, Path, description = "Budget identifier")),
    request_body(content = Object, description = "Multipart form with one or more 'file' fields"),
    responses(
        (status = 200, description = "Files stored", body = UploadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Budget not found"),
        (status = 409, description = "Budget is closed for editing"),
        (status = 422, description = "No files or invalid file")
    ),
    security(("session_auth" = []))
)]
pub async fn upload_budget_files(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(identifier): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let row = fetch_budget(&state.pool, &identifier.to_string()).await?;

    if !row.editable {
        log_guard_violation(
            &state,
            "budget attachment upload rejected: closed for editing",
            &row.identifier,
            &auth,
        )
        .await;
        return Err(ApiError::Conflict("budget is closed for editing".to_string()));
    }

    let files =
        attachments::store_uploads(&state, &BUDGET_FILES, row.id, &row.identifier, multipart)
            .await?;

    Ok(Json(UploadResponse { files }))
}

/// GET /budgets/files/{file_id} - Download a budget attachment
#[utoipa::path(
    get,
    path = "/budgets/files/{file_id}",
    tag = "Budgets",
    params(("file_id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "File contents"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attachment not found")
    ),
    security(("session_auth" = []))
)]
pub async fn download_budget_file(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    attachments::download_file(&state, &BUDGET_FILES, file_id).await
}

/// DELETE /budgets/files/{file_id} - Delete a budget attachment
#[utoipa::path(
    delete,
    path = "/budgets/files/{file_id}",
    tag = "Budgets",
    params(("file_id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attachment not found"),
        (status = 409, description = "Budget is closed for editing")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_budget_file(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(file_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    attachments::delete_file(&state, &BUDGET_FILES, file_id, &auth).await
}
