//! Activity log routes.
//!
//! Read side of the activity log: entries written by the middleware
//! (state-changing requests) and by handlers (guard violations),
//! newest first.

use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use sqlx::QueryBuilder;
use utoipa::{IntoParams, ToSchema};

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use crate::models::activity::{ActivityLevel, ActivityResponse, ActivityRow};

/// Query parameters for activity history
#[derive(Deserialize, IntoParams)]
pub struct ActivityQueryParams {
    /// Limit number of results (default: 100)
    #[param(default = 100)]
    limit: Option<i64>,
    /// Offset for pagination (default: 0)
    #[param(default = 0)]
    offset: Option<i64>,
    /// Filter by level: INFO, WARNING or ERROR
    level: Option<String>,
}

/// Activity history response
#[derive(Serialize, ToSchema)]
pub struct ActivityListResponse {
    pub entries: Vec<ActivityResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Create the activity router
pub fn activity_router() -> Router<AppState> {
    Router::new().route("/", get(list_activity))
}

/// GET /activity - Activity log entries, newest first
#[utoipa::path(
    get,
    path = "/activity",
    tag = "Activity",
    params(ActivityQueryParams),
    responses(
        (status = 200, description = "Activity entries retrieved successfully", body = ActivityListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid level filter")
    ),
    security(("session_auth" = []))
)]
pub async fn list_activity(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(params): Query<ActivityQueryParams>,
) -> Result<Json<ActivityListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let offset = params.offset.unwrap_or(0).max(0);

    let level = match params.level.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(ActivityLevel::parse(raw).ok_or_else(|| {
            ApiError::Validation(format!("invalid activity level: {}", raw))
        })?),
    };

    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM activity_log WHERE 1 = 1");
    if let Some(level) = level {
        count_builder.push(" AND level = ");
        count_builder.push_bind(level.as_str());
    }
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(&state.pool)
        .await?;

    let mut builder = QueryBuilder::new(
        "SELECT id, level, action, method, path, ip_address, username, extra_data, created_at \
         FROM activity_log WHERE 1 = 1",
    );
    if let Some(level) = level {
        builder.push(" AND level = ");
        builder.push_bind(level.as_str());
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows: Vec<ActivityRow> = builder.build_query_as().fetch_all(&state.pool).await?;

    Ok(Json(ActivityListResponse {
        entries: rows.into_iter().map(ActivityResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}
