//! Catalog routes: currencies, transaction types and transaction
//! statuses.
//!
//! Currencies and transaction types are protected references: they
//! cannot be deleted while budgets or bills point at them. Deleting a
//! transaction status is allowed; referencing records keep running
//! with no status (SET NULL).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::{MessageResponse, log_guard_violation};
use crate::models::catalog::{
    CurrencyPayload, CurrencyRow, TransactionStatusPayload, TransactionStatusRow,
    TransactionTypePayload, TransactionTypeRow,
};

/// Create the currencies router
pub fn currencies_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_currencies).post(create_currency))
        .route("/{id}", get(get_currency).put(update_currency).delete(delete_currency))
}

/// Create the transaction types router
pub fn transaction_types_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transaction_types).post(create_transaction_type))
        .route(
            "/{id}",
            get(get_transaction_type)
                .put(update_transaction_type)
                .delete(delete_transaction_type),
        )
}

/// Create the transaction statuses router
pub fn transaction_statuses_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_transaction_statuses).post(create_transaction_status),
        )
        .route(
            "/{id}",
            get(get_transaction_status)
                .put(update_transaction_status)
                .delete(delete_transaction_status),
        )
}

/// How many budgets and bills reference a catalog row.
async fn reference_count(
    pool: &SqlitePool,
    column: &str,
    id: i64,
) -> Result<(i64, i64), ApiError> {
    let budgets_sql = format!("SELECT COUNT(*) FROM budgets WHERE {} = ?", column);
    let bills_sql = format!("SELECT COUNT(*) FROM bills WHERE {} = ?", column);

    let budgets: i64 = sqlx::query_scalar(&budgets_sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    let bills: i64 = sqlx::query_scalar(&bills_sql)
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok((budgets, bills))
}

// -- Currencies --

async fn fetch_currency(pool: &SqlitePool, id: i64) -> Result<CurrencyRow, ApiError> {
    sqlx::query_as::<_, CurrencyRow>("SELECT id, name, code, symbol FROM currencies WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)
}

async fn currency_code_taken(
    pool: &SqlitePool,
    code: &str,
    exclude_id: Option<i64>,
) -> Result<bool, ApiError> {
    let taken = match exclude_id {
        Some(id) => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM currencies WHERE code = ? AND id != ?)",
            )
            .bind(code)
            .bind(id)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM currencies WHERE code = ?)")
                .bind(code)
                .fetch_one(pool)
                .await?
        }
    };
    Ok(taken)
}

/// GET /currencies - List currencies
#[utoipa::path(
    get,
    path = "/currencies",
    tag = "Catalogs",
    responses(
        (status = 200, description = "Currencies retrieved successfully", body = [CurrencyRow]),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn list_currencies(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<CurrencyRow>>, ApiError> {
    let rows =
        sqlx::query_as::<_, CurrencyRow>("SELECT id, name, code, symbol FROM currencies ORDER BY id")
            .fetch_all(&state.pool)
            .await?;
    Ok(Json(rows))
}

/// GET /currencies/{id} - Currency detail
#[utoipa::path(
    get,
    path = "/currencies/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Currency id")),
    responses(
        (status = 200, description = "Currency retrieved successfully", body = CurrencyRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Currency not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_currency(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<CurrencyRow>, ApiError> {
    Ok(Json(fetch_currency(&state.pool, id).await?))
}

/// POST /currencies - Create a currency
#[utoipa::path(
    post,
    path = "/currencies",
    tag = "Catalogs",
    request_body = CurrencyPayload,
    responses(
        (status = 201, description = "Currency created", body = CurrencyRow),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_currency(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<CurrencyPayload>,
) -> Result<(StatusCode, Json<CurrencyRow>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;
    let code = payload.code.to_ascii_uppercase();

    if currency_code_taken(&state.pool, &code, None).await? {
        return Err(ApiError::Validation(format!(
            "currency code '{}' already exists",
            code
        )));
    }

    let result = sqlx::query("INSERT INTO currencies (name, code, symbol) VALUES (?, ?, ?)")
        .bind(payload.name.trim())
        .bind(&code)
        .bind(&payload.symbol)
        .execute(&state.pool)
        .await?;

    let row = fetch_currency(&state.pool, result.last_insert_rowid()).await?;
    info!("currency '{}' created by {}", row.code, auth.user.username);

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /currencies/{id} - Update a currency
#[utoipa::path(
    put,
    path = "/currencies/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Currency id")),
    request_body = CurrencyPayload,
    responses(
        (status = 200, description = "Currency updated", body = CurrencyRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Currency not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_currency(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(payload): Json<CurrencyPayload>,
) -> Result<Json<CurrencyRow>, ApiError> {
    let row = fetch_currency(&state.pool, id).await?;
    payload.validate().map_err(ApiError::Validation)?;
    let code = payload.code.to_ascii_uppercase();

    if currency_code_taken(&state.pool, &code, Some(row.id)).await? {
        return Err(ApiError::Validation(format!(
            "currency code '{}' already exists",
            code
        )));
    }

    sqlx::query("UPDATE currencies SET name = ?, code = ?, symbol = ? WHERE id = ?")
        .bind(payload.name.trim())
        .bind(&code)
        .bind(&payload.symbol)
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    let updated = fetch_currency(&state.pool, row.id).await?;
    info!("currency '{}' updated by {}", updated.code, auth.user.username);

    Ok(Json(updated))
}

/// DELETE /currencies/{id} - Delete a currency
#[utoipa::path(
    delete,
    path = "/currencies/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Currency id")),
    responses(
        (status = 200, description = "Currency deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Currency not found"),
        (status = 409, description = "Currency is referenced by budgets or bills")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_currency(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = fetch_currency(&state.pool, id).await?;

    let (budgets, bills) = reference_count(&state.pool, "currency_id", row.id).await?;
    if budgets > 0 || bills > 0 {
        warn!(
            "currency '{}' referenced by {} budgets and {} bills, delete rejected (user {})",
            row.code, budgets, bills, auth.user.username
        );
        log_guard_violation(
            &state,
            "currency delete rejected: referenced by records",
            &row.id.to_string(),
            &auth,
        )
        .await;
        return Err(ApiError::Conflict(
            "currency is referenced by budgets or bills and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM currencies WHERE id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    info!("currency '{}' deleted by {}", row.code, auth.user.username);

    Ok(Json(MessageResponse {
        message: format!("currency '{}' deleted", row.code),
    }))
}

// -- Transaction types --

async fn fetch_transaction_type(pool: &SqlitePool, id: i64) -> Result<TransactionTypeRow, ApiError> {
    sqlx::query_as::<_, TransactionTypeRow>(
        "SELECT id, name, created_at, updated_at FROM transaction_types WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound)
}

/// GET /transaction-types - List transaction types
#[utoipa::path(
    get,
    path = "/transaction-types",
    tag = "Catalogs",
    responses(
        (status = 200, description = "Transaction types retrieved successfully", body = [TransactionTypeRow]),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn list_transaction_types(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<TransactionTypeRow>>, ApiError> {
    let rows = sqlx::query_as::<_, TransactionTypeRow>(
        "SELECT id, name, created_at, updated_at FROM transaction_types ORDER BY id",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows))
}

/// GET /transaction-types/{id} - Transaction type detail
#[utoipa::path(
    get,
    path = "/transaction-types/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Transaction type id")),
    responses(
        (status = 200, description = "Transaction type retrieved successfully", body = TransactionTypeRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction type not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_transaction_type(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<TransactionTypeRow>, ApiError> {
    Ok(Json(fetch_transaction_type(&state.pool, id).await?))
}

/// POST /transaction-types - Create a transaction type
#[utoipa::path(
    post,
    path = "/transaction-types",
    tag = "Catalogs",
    request_body = TransactionTypePayload,
    responses(
        (status = 201, description = "Transaction type created", body = TransactionTypeRow),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_transaction_type(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<TransactionTypePayload>,
) -> Result<(StatusCode, Json<TransactionTypeRow>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO transaction_types (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(payload.name.trim())
            .bind(now)
            .bind(now)
            .execute(&state.pool)
            .await?;

    let row = fetch_transaction_type(&state.pool, result.last_insert_rowid()).await?;
    info!(
        "transaction type '{}' created by {}",
        row.name, auth.user.username
    );

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /transaction-types/{id} - Update a transaction type
#[utoipa::path(
    put,
    path = "/transaction-types/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Transaction type id")),
    request_body = TransactionTypePayload,
    responses(
        (status = 200, description = "Transaction type updated", body = TransactionTypeRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction type not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_transaction_type(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionTypePayload>,
) -> Result<Json<TransactionTypeRow>, ApiError> {
    let row = fetch_transaction_type(&state.pool, id).await?;
    payload.validate().map_err(ApiError::Validation)?;

    sqlx::query("UPDATE transaction_types SET name = ?, updated_at = ? WHERE id = ?")
        .bind(payload.name.trim())
        .bind(Utc::now())
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    let updated = fetch_transaction_type(&state.pool, row.id).await?;
    info!(
        "transaction type '{}' updated by {}",
        updated.name, auth.user.username
    );

    Ok(Json(updated))
}

/// DELETE /transaction-types/{id} - Delete a transaction type
#[utoipa::path(
    delete,
    path = "/transaction-types/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Transaction type id")),
    responses(
        (status = 200, description = "Transaction type deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction type not found"),
        (status = 409, description = "Transaction type is referenced by budgets or bills")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_transaction_type(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = fetch_transaction_type(&state.pool, id).await?;

    let (budgets, bills) = reference_count(&state.pool, "type_id", row.id).await?;
    if budgets > 0 || bills > 0 {
        warn!(
            "transaction type '{}' referenced by {} budgets and {} bills, delete rejected (user {})",
            row.name, budgets, bills, auth.user.username
        );
        log_guard_violation(
            &state,
            "transaction type delete rejected: referenced by records",
            &row.id.to_string(),
            &auth,
        )
        .await;
        return Err(ApiError::Conflict(
            "transaction type is referenced by budgets or bills and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM transaction_types WHERE id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    info!(
        "transaction type '{}' deleted by {}",
        row.name, auth.user.username
    );

    Ok(Json(MessageResponse {
        message: format!("transaction type '{}' deleted", row.name),
    }))
}

// -- Transaction statuses --

async fn fetch_transaction_status(
    pool: &SqlitePool,
    id: i64,
) -> Result<TransactionStatusRow, ApiError> {
    sqlx::query_as::<_, TransactionStatusRow>(
        "SELECT id, name, closes_records, created_at, updated_at FROM transaction_statuses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound)
}

/// GET /transaction-statuses - List transaction statuses
#[utoipa::path(
    get,
    path = "/transaction-statuses",
    tag = "Catalogs",
    responses(
        (status = 200, description = "Transaction statuses retrieved successfully", body = [TransactionStatusRow]),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn list_transaction_statuses(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<TransactionStatusRow>>, ApiError> {
    let rows = sqlx::query_as::<_, TransactionStatusRow>(
        "SELECT id, name, closes_records, created_at, updated_at FROM transaction_statuses ORDER BY id",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows))
}

/// GET /transaction-statuses/{id} - Transaction status detail
#[utoipa::path(
    get,
    path = "/transaction-statuses/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Transaction status id")),
    responses(
        (status = 200, description = "Transaction status retrieved successfully", body = TransactionStatusRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction status not found")
    ),
    security(("session_auth" = []))
)]
pub async fn get_transaction_status(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<TransactionStatusRow>, ApiError> {
    Ok(Json(fetch_transaction_status(&state.pool, id).await?))
}

/// POST /transaction-statuses - Create a transaction status
#[utoipa::path(
    post,
    path = "/transaction-statuses",
    tag = "Catalogs",
    request_body = TransactionStatusPayload,
    responses(
        (status = 201, description = "Transaction status created", body = TransactionStatusRow),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn create_transaction_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(payload): Json<TransactionStatusPayload>,
) -> Result<(StatusCode, Json<TransactionStatusRow>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO transaction_statuses (name, closes_records, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(payload.name.trim())
    .bind(payload.closes_records)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let row = fetch_transaction_status(&state.pool, result.last_insert_rowid()).await?;
    info!(
        "transaction status '{}' created by {}",
        row.name, auth.user.username
    );

    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /transaction-statuses/{id} - Update a transaction status
#[utoipa::path(
    put,
    path = "/transaction-statuses/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Transaction status id")),
    request_body = TransactionStatusPayload,
    responses(
        (status = 200, description = "Transaction status updated", body = TransactionStatusRow),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction status not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("session_auth" = []))
)]
pub async fn update_transaction_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionStatusPayload>,
) -> Result<Json<TransactionStatusRow>, ApiError> {
    let row = fetch_transaction_status(&state.pool, id).await?;
    payload.validate().map_err(ApiError::Validation)?;

    sqlx::query(
        "UPDATE transaction_statuses SET name = ?, closes_records = ?, updated_at = ? WHERE id = ?",
    )
    .bind(payload.name.trim())
    .bind(payload.closes_records)
    .bind(Utc::now())
    .bind(row.id)
    .execute(&state.pool)
    .await?;

    let updated = fetch_transaction_status(&state.pool, row.id).await?;
    info!(
        "transaction status '{}' updated by {}",
        updated.name, auth.user.username
    );

    Ok(Json(updated))
}

/// DELETE /transaction-statuses/{id} - Delete a transaction status
///
/// Always allowed: budgets and bills that referenced the status keep
/// running with no status.
#[utoipa::path(
    delete,
    path = "/transaction-statuses/{id}",
    tag = "Catalogs",
    params(("id" = i64, Path, description = "Transaction status id")),
    responses(
        (status = 200, description = "Transaction status deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction status not found")
    ),
    security(("session_auth" = []))
)]
pub async fn delete_transaction_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let row = fetch_transaction_status(&state.pool, id).await?;

    sqlx::query("DELETE FROM transaction_statuses WHERE id = ?")
        .bind(row.id)
        .execute(&state.pool)
        .await?;

    info!(
        "transaction status '{}' deleted by {}",
        row.name, auth.user.username
    );

    Ok(Json(MessageResponse {
        message: format!("transaction status '{}' deleted", row.name),
    }))
}
