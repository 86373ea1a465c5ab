//! Aggregation report over the caller's visible records.
//!
//! Mirrors the back-office summary screen: overall totals and balance,
//! a row per visible department, per transaction type and per status
//! (only rows with activity), plus the five most recent budgets and
//! bills.

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use sqlx::{QueryBuilder, SqlitePool};
use utoipa::ToSchema;

use super::app_state::AppState;
use super::auth_context::{AuthContext, push_department_scope};
use super::bills::BILL_COLUMNS;
use super::budgets::BUDGET_COLUMNS;
use super::departments::visible_departments;
use super::error::ApiError;
use crate::models::bill::{BillResponse, BillRow};
use crate::models::budget::{BudgetResponse, BudgetRow};
use crate::models::catalog::{DepartmentRow, TransactionStatusRow, TransactionTypeRow};

/// Totals per department
#[derive(Serialize, ToSchema)]
pub struct DepartmentSummary {
    pub department: DepartmentRow,
    pub total_budgets: i64,
    pub total_bills: i64,
    pub balance: i64,
    pub budgets_count: i64,
    pub bills_count: i64,
}

/// Totals per transaction type
#[derive(Serialize, ToSchema)]
pub struct TypeSummary {
    pub transaction_type: TransactionTypeRow,
    pub budgets: i64,
    pub bills: i64,
}

/// Totals per transaction status
#[derive(Serialize, ToSchema)]
pub struct StatusSummary {
    pub status: TransactionStatusRow,
    pub budgets: i64,
    pub bills: i64,
    pub budgets_count: i64,
    pub bills_count: i64,
}

/// Summary report response
#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub total_budgets: i64,
    pub total_bills: i64,
    pub balance: i64,
    pub budgets_count: i64,
    pub bills_count: i64,
    pub departments_count: i64,
    pub departments: Vec<DepartmentSummary>,
    pub types: Vec<TypeSummary>,
    pub statuses: Vec<StatusSummary>,
    pub recent_budgets: Vec<BudgetResponse>,
    pub recent_bills: Vec<BillResponse>,
}

/// Create the reports router
pub fn reports_router() -> Router<AppState> {
    Router::new().route("/summary", get(get_summary))
}

/// Sum and count over a record table, optionally filtered by one
/// column, always restricted to the caller's department scope.
async fn scoped_sum_count(
    pool: &SqlitePool,
    table: &str,
    column_filter: Option<(&str, i64)>,
    scope: Option<&[i64]>,
) -> Result<(i64, i64), ApiError> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT COALESCE(SUM(total_amount), 0), COUNT(*) FROM {} WHERE 1 = 1",
        table
    ));
    if let Some((column, id)) = column_filter {
        builder.push(format!(" AND {} = ", column));
        builder.push_bind(id);
    }
    push_department_scope(&mut builder, scope);

    let row: (i64, i64) = builder.build_query_as().fetch_one(pool).await?;
    Ok(row)
}

/// GET /reports/summary - Budget/bill aggregation report
#[utoipa::path(
    get,
    path = "/reports/summary",
    tag = "Reports",
    responses(
        (status = 200, description = "Summary retrieved successfully", body = SummaryResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_auth" = []))
)]
pub async fn get_summary(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<SummaryResponse>, ApiError> {
    let scope = auth.user.department_scope();
    let pool = &state.pool;

    let (total_budgets, budgets_count) = scoped_sum_count(pool, "budgets", None, scope).await?;
    let (total_bills, bills_count) = scoped_sum_count(pool, "bills", None, scope).await?;

    let departments = visible_departments(pool, &auth).await?;
    let mut department_rows = Vec::with_capacity(departments.len());
    for department in departments {
        let (dept_budgets, dept_budgets_count) =
            scoped_sum_count(pool, "budgets", Some(("department_id", department.id)), scope)
                .await?;
        let (dept_bills, dept_bills_count) =
            scoped_sum_count(pool, "bills", Some(("department_id", department.id)), scope).await?;

        department_rows.push(DepartmentSummary {
            balance: dept_budgets - dept_bills,
            total_budgets: dept_budgets,
            total_bills: dept_bills,
            budgets_count: dept_budgets_count,
            bills_count: dept_bills_count,
            department,
        });
    }

    let types = sqlx::query_as::<_, TransactionTypeRow>(
        "SELECT id, name, created_at, updated_at FROM transaction_types ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    let mut type_rows = Vec::new();
    for transaction_type in types {
        let (budgets, _) =
            scoped_sum_count(pool, "budgets", Some(("type_id", transaction_type.id)), scope)
                .await?;
        let (bills, _) =
            scoped_sum_count(pool, "bills", Some(("type_id", transaction_type.id)), scope).await?;

        if budgets > 0 || bills > 0 {
            type_rows.push(TypeSummary {
                transaction_type,
                budgets,
                bills,
            });
        }
    }

    let statuses = sqlx::query_as::<_, TransactionStatusRow>(
        "SELECT id, name, closes_records, created_at, updated_at FROM transaction_statuses ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    let mut status_rows = Vec::new();
    for status in statuses {
        let (budgets, status_budgets_count) =
            scoped_sum_count(pool, "budgets", Some(("status_id", status.id)), scope).await?;
        let (bills, status_bills_count) =
            scoped_sum_count(pool, "bills", Some(("status_id", status.id)), scope).await?;

        if budgets > 0 || bills > 0 {
            status_rows.push(StatusSummary {
                status,
                budgets,
                bills,
                budgets_count: status_budgets_count,
                bills_count: status_bills_count,
            });
        }
    }

    let mut recent_budgets_builder =
        QueryBuilder::new(format!("SELECT {} FROM budgets WHERE 1 = 1", BUDGET_COLUMNS));
    push_department_scope(&mut recent_budgets_builder, scope);
    recent_budgets_builder.push(" ORDER BY created_at DESC, id DESC LIMIT 5");
    let recent_budgets: Vec<BudgetRow> = recent_budgets_builder
        .build_query_as()
        .fetch_all(pool)
        .await?;

    let mut recent_bills_builder =
        QueryBuilder::new(format!("SELECT {} FROM bills WHERE 1 = 1", BILL_COLUMNS));
    push_department_scope(&mut recent_bills_builder, scope);
    recent_bills_builder.push(" ORDER BY created_at DESC, id DESC LIMIT 5");
    let recent_bills: Vec<BillRow> = recent_bills_builder.build_query_as().fetch_all(pool).await?;

    Ok(Json(SummaryResponse {
        total_budgets,
        total_bills,
        balance: total_budgets - total_bills,
        budgets_count,
        bills_count,
        departments_count: department_rows.len() as i64,
        departments: department_rows,
        types: type_rows,
        statuses: status_rows,
        recent_budgets: recent_budgets.into_iter().map(BudgetResponse::from).collect(),
        recent_bills: recent_bills.into_iter().map(BillResponse::from).collect(),
    }))
}
