//! Bill routes.
//!
//! CRUD over bills plus their attachments. The list supports filtering
//! by category (`category=<id>` or `category=none` for uncategorized
//! bills). Closed bills reject update, delete and attachment mutation.

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
use super::attachments::{self, BILL_FILES};
use super::auth_context::{AuthContext, push_department_scope};
use super::budgets::{UploadResponse, default_status_id, status_closes_records};
use super::error::ApiError;
use super::{MessageResponse, log_guard_violation, row_exists};
use crate::models::attachment::AttachmentResponse;
use crate::models::bill::{BillPayload, BillResponse, BillRow};

pub(crate) const BILL_COLUMNS: &str = "id, title, description, total_amount, identifier, \
     due_date, enabled, editable, budget_id, category_id, status_id, type_id, currency_id, \
     department_id, created_at, updated_at";

/// Query parameters for the bill list
#[derive(Deserialize, IntoParams)]
pub struct BillListParams {
    /// Limit number of results (default: 10)
    #[param(default = 10)]
    limit: Option<i64>,
    /// Offset for pagination (default: 0)
    #[param(default = 0)]
    offset: Option<i64>,
    /// Category id, or "none" for uncategorized bills
    category: Option<String>,
}

/// Category filter parsed from the query string.
enum CategoryFilter {
    Any,
    Uncategorized,
    Category(i64),
}

impl CategoryFilter {
    fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw {
            None | Some("") => Ok(CategoryFilter::Any),
            Some("none") => Ok(CategoryFilter::Uncategorized),
            Some(value) => value
                .parse::<i64>()
                .map(CategoryFilter::Category)
                .map_err(|_| {
                    ApiError::Validation(format!("invalid category filter: {}", value))
                }),
        }
    }

    fn push(&self, builder: &mut QueryBuilder<'_, sqlx::Sqlite>) {
        match self {
            CategoryFilter::Any => {}
            CategoryFilter::Uncategorized => {
                builder.push(" AND category_id IS NULL");
            }
            CategoryFilter::Category(id) => {
                builder.push(" AND category_id = ");
                builder.push_bind(*id);
            }
        }
    }
}

/// Bill list response
#[derive(Serialize, ToSchema)]
pub struct BillListResponse {
    pub items: Vec<BillResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Bill detail response with attachments
#[derive(Serialize, ToSchema)]
pub struct BillDetailResponse {
    pub bill: BillResponse,
    pub files: Vec<AttachmentResponse>,
}

/// Create the bills router
pub fn bills_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bills).post(create_bill))
        .route(
            "/{identifier}",
            get(get_bill).put(update_bill).delete(delete_bill),
        )
        .route(
            "/{identifier}/files",
            get(list_bill_files).post(upload_bill_files),
        )
        .route(
            "/files/{file_id}",
            get(download_bill_file).delete(delete_bill_file),
        )
}

/// Fetch a bill by its public identifier.
pub(crate) async fn fetch_bill(pool: &SqlitePool, identifier: &str) -> Result<BillRow, ApiError> {
    let sql = format!("SELECT {} FROM bills WHERE identifier = ?", BILL_COLUMNS);
    sqlx::query_as::<_, BillRow>(&sql)
        .bind(identifier)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)
}

async fn check_bill_refs(pool: &SqlitePool, payload: &BillPayload) -> Result<(), ApiError> {
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
    if let Some(id) = payload.budget_id {
        if !row_exists(pool, "budgets", id).await? {
            return Err(ApiError::Validation("unknown budget".to_string()));
        }
    }
    if let Some(id) = payload.category_id {
        if !row_exists(pool, "bill_categories", id).await? {
            return Err(ApiError::Validation("unknown bill category".to_string()));
        }
    }
    Ok(())
}

/// GET /bills - List visible bills, newest first
#[utoipa::path(
    get,
    path = "/bills",
    tag = "Bills",
    params(BillListParams),
    responses(
        (status = 200, description = "Bills retrieved successfully", body = BillListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid category filter")
    ),
    security(("session_auth" = []))
)]
pub async fn list_bills(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<BillListParams>,
) -> Result<Json<BillListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);
    let scope = auth.user.department_scope();
    let category = CategoryFilter::parse(params.category.as_deref())?;

    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM bills WHERE 1 = 1");
    push_department_scope(&mut count_builder, scope);
    category.push(&mut count_builder);
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(&state.pool)
        .await?;

    let mut builder = QueryBuilder::new(format!("SELECT {} FROM bills WHERE 1 = 1", BILL_COLUMNS));
    push_department_scope(&mut builder, scope);
    category.push(&mut builder);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows: Vec<BillRow> = builder.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(BillListResponse {
        items: rows.into_iter().map(BillResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// POST /bills - Create a bill
#[utoipa::path(
    post,
    path = "/bills",
    tag = "Bills",
    request_body = BillPayload,
    responses(
        (status = 201, description = "Bill created", body = BillResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_bill(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<BillPayload>,
) -> Result<(StatusCode, Json<BillResponse>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;
    check_bill_refs(&state.pool, &payload).await?;

    let status_id = match payload.status_id {
        Some(id) => Some(id),
        None => default_status_id(&state.pool).await?,
    };
    let editable = !status_closes_records(&state.pool, status_id).await?;
    let identifier = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO bills
            (title, description, total_amount, identifier, due_date, enabled, editable,
             budget_id, category_id, status_id, type_id, currency_id, department_id,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.total_amount)
    .bind(&identifier)
    .bind(payload.due_date)
    .bind(editable)
    .bind(payload.budget_id)
    .bind(payload.category_id)
    .bind(status_id)
    .bind(payload.type_id)
    .bind(payload.currency_id)
    .bind(payload.department_id)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let row = fetch_bill(&state.pool, &identifier).await?;
    info!("bill '{}' created by {}", row.title, auth.user.username);

    Ok((StatusCode::CREATED, Json(BillResponse::from(row))))
}

/// GET /bills/{identifier} - Bill detail with attachments
#[utoipa::path(
    get,
    path = "/bills/{identifier}",
    tag = "Bills",
    params(("identifier" = Uuid, Path, description = "Bill identifier")),
    responses(
        (status = 200, description = "Bill retrieved successfully", body = BillDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_bill(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(identifier): Path<Uuid>,
) -> Result<Json<BillDetailResponse>, ApiError> {
    let row = fetch_bill(&state.pool, &identifier.to_string()).await?;
    let files = attachments::list_files(&state, &BILL_FILES, row.id).await?;

    Ok(Json(BillDetailResponse {
        bill: BillResponse::from(row),
        files,
    }))
}

/// PUT /bills/{identifier} - Update a bill
#[utoipa::path(
    put,
    path = "/bills/{identifier}",
    tag = "Bills",
    params(("identifier" = Uuid, Path, description = "Bill identifier")),
    request_body = BillPayload,
    responses(
        (status = 200, description = "Bill updated", body = BillResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill is closed for editing"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_bill(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(identifier): Path<Uuid>,
    Json(payload): Json<BillPayload>,
) -> Result<Json<BillResponse>, ApiError> {
    let row = fetch_bill(&state.pool, &identifier.to_string()).await?;

    if !row.editable {
        warn!(
            "bill '{}' ({}) is closed and cannot be edited (user {})",
            row.title, row.identifier, auth.user.username
        );
        log_guard_violation(
            &state,
            "bill update rejected: closed for editing",
            &row.identifier,
            &auth,
        )
        .await;
        return Err(ApiError::Conflict("bill is closed for editing".to_string()));
    }

    payload.validate().map_err(ApiError::Validation)?;
    check_bill_refs(&state.pool, &payload).await?;

    let editable = !status_closes_records(&state.pool, payload.status_id).await?;

    sqlx::query(
        r#"
        UPDATE bills
        SET title = ?, description = ?, total_amount = ?, due_date = ?, budget_id = ?,
            category_id = ?, status_id = ?, type_id = ?, currency_id = ?, department_id = ?,
            editable = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.total_amount)
    .bind(payload.due_date)
    .bind(payload.budget_id)
    .bind(payload.category_id)
    .bind(payload.status_id)
    .bind(payload.type_id)
    .bind(payload.currency_id)
    .bind(payload.department_id)
    .bind(editable)
    .bind(Utc::now())
    .bind(row.id)
    .execute(&state.pool)
    .await?;

    let updated = fetch_bill(&state.pool, &row.identifier).await?;
    info!("bill '{}' updated by {}", updated.title, auth.user.username);

    Ok(Json(BillResponse::from(updated)))
}

/// DELETE /bills/{identifier} - Delete a bill
#[utoipa::path(
    delete,
    path = "/bills/{identifier}",
    tag = "Bills",
    params(("identifier" = Uuid, Path, description = "Bill identifier")),
    responses(
        (status = 200, description = "Bill deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill is closed for editing")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_bill(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(identifier): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = fetch_bill(&state.pool, &identifier.to_string()).await?;

    if !row.editable {
        warn!(
            "bill '{}' ({}) is closed and cannot be deleted (user {})",
            row.title, row.identifier, auth.user.username
        );
        log_guard_violation(
            &state,
            "bill delete rejected: closed for editing",
            &row.identifier,
            &auth,
        )
        .await;
        return Err(ApiError::Conflict(
            "bill is closed and cannot be deleted".to_string(),
        ));
    }

    attachments::remove_record_files(&state, &BILL_FILES, row.id).await?;

    sqlx::query("DELETE FROM bills WHERE id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    info!("bill '{}' deleted by {}", row.title, auth.user.username);

    Ok(Json(MessageResponse {
        message: format!("bill '{}' deleted", row.title),
    }))
}

/// GET /bills/{identifier}/files - List bill attachments
#[utoipa::path(
    get,
    path = "/bills/{identifier}/files",
    tag = "Bills",
    params(("identifier" = Uuid, Path, description = "Bill identifier")),
    responses(
        (status = 200, description = "Attachments retrieved successfully", body = UploadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found")
    ),
    security(("session_auth" = []))
)]
pub async fn list_bill_files(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(identifier): Path<Uuid>,
) -> Result<Json<UploadResponse>, ApiError> {
    let row = fetch_bill(&state.pool, &identifier.to_string()).await?;
    let files = attachments::list_files(&state, &BILL_FILES, row.id).await?;

    Ok(Json(UploadResponse { files }))
}

/// POST /bills/{identifier}/files - Attach files to a bill
#[utoipa::path(
    post,
    path = "/bills/{identifier}/files",
    tag = "Bills",
    params(("identifier" = Uuid, Path, description = "Bill identifier")),
    request_body(content = Object, description = "Multipart form with one or more 'file' fields"),
    responses(
        (status = 200, description = "Files stored", body = UploadResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill is closed for editing"),
        (status = 422, description = "No files or invalid file")
    ),
    security(("session_auth" = []))
)]
pub async fn upload_bill_files(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(identifier): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let row = fetch_bill(&state.pool, &identifier.to_string()).await?;

    if !row.editable {
        log_guard_violation(
            &state,
            "bill attachment upload rejected: closed for editing",
            &row.identifier,
            &auth,
        )
        .await;
        return Err(ApiError::Conflict("bill is closed for editing".to_string()));
    }

    let files =
        attachments::store_uploads(&state, &BILL_FILES, row.id, &row.identifier, multipart).await?;

    Ok(Json(UploadResponse { files }))
}

/// GET /bills/files/{file_id} - Download a bill attachment
#[utoipa::path(
    get,
    path = "/bills/files/{file_id}",
    tag = "Bills",
    params(("file_id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "File contents"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attachment not found")
    ),
    security(("session_auth" = []))
)]
pub async fn download_bill_file(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    attachments::download_file(&state, &BILL_FILES, file_id).await
}

/// DELETE /bills/files/{file_id} - Delete a bill attachment
#[utoipa::path(
    delete,
    path = "/bills/files/{file_id}",
    tag = "Bills",
    params(("file_id" = i64, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attachment not found"),
        (status = 409, description = "Bill is closed for editing")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_bill_file(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(file_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    attachments::delete_file(&state, &BILL_FILES, file_id, &auth).await
}
