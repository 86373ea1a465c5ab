//! API routes module - organizes all route handlers.
//!
//! Every resource router nests under /api/v1; the activity log
//! middleware wraps the whole API surface.

pub mod activity;
pub mod app_state;
pub mod attachments;
pub mod auth;
pub mod auth_context;
pub mod bills;
pub mod budgets;
pub mod catalogs;
pub mod categories;
pub mod departments;
pub mod error;
pub mod openapi;
pub mod reports;
pub mod users;

use axum::Router;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

pub use app_state::AppState;
pub use error::ApiError;

use auth_context::AuthContext;
use crate::models::activity::NewActivityEntry;

/// Plain confirmation message body.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Create the main API router combining all route modules.
///
/// The state is applied by the caller (`.with_state(app_state)`); the
/// handle passed here only feeds the activity middleware.
pub fn create_api_router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::auth_router())
        .nest("/budgets", budgets::budgets_router())
        .nest("/bills", bills::bills_router())
        .nest("/categories", categories::categories_router())
        .nest("/departments", departments::departments_router())
        .nest("/currencies", catalogs::currencies_router())
        .nest("/transaction-types", catalogs::transaction_types_router())
        .nest(
            "/transaction-statuses",
            catalogs::transaction_statuses_router(),
        )
        .nest("/users", users::users_router())
        .nest("/reports", reports::reports_router())
        .nest("/activity", activity::activity_router())
        .merge(openapi::openapi_router())
        .layer(axum::middleware::from_fn_with_state(
            app_state,
            crate::middleware::activity_log::record_activity,
        ))
}

/// Record a guard violation (closed record, referenced record) as a
/// WARNING activity entry. Never fails the request.
pub(crate) async fn log_guard_violation(
    state: &AppState,
    action: &str,
    identifier: &str,
    auth: &AuthContext,
) {
    let entry = NewActivityEntry::warning(action, identifier, Some(auth.user.username.clone()));
    if let Err(e) = crate::middleware::activity_log::record_entry(&state.pool, entry).await {
        tracing::error!("failed to record guard violation: {}", e);
    }
}

/// True when the given id exists in `table`.
///
/// `table` must be a static identifier, never request data.
pub(crate) async fn row_exists(
    pool: &SqlitePool,
    table: &str,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table);
    sqlx::query_scalar::<_, bool>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
}
