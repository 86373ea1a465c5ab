//! Budget records: planned allocations of funds for a department.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Budget row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BudgetRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub total_amount: i64,
    pub identifier: String,
    pub due_date: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub editable: bool,
    pub status_id: Option<i64>,
    pub type_id: i64,
    pub currency_id: i64,
    pub department_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Budget as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i64,
    pub identifier: Uuid,
    pub title: String,
    pub description: String,
    pub total_amount: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub editable: bool,
    pub status_id: Option<i64>,
    pub type_id: i64,
    pub currency_id: i64,
    pub department_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BudgetRow> for BudgetResponse {
    fn from(row: BudgetRow) -> Self {
        Self {
            id: row.id,
            identifier: Uuid::parse_str(&row.identifier).unwrap_or_default(),
            title: row.title,
            description: row.description,
            total_amount: row.total_amount,
            due_date: row.due_date,
            enabled: row.enabled,
            editable: row.editable,
            status_id: row.status_id,
            type_id: row.type_id,
            currency_id: row.currency_id,
            department_id: row.department_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Budget create/update body. PUT is a full update, like the original
/// edit form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BudgetPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub total_amount: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub status_id: Option<i64>,
    pub type_id: i64,
    pub currency_id: i64,
    pub department_id: Option<i64>,
}

impl BudgetPayload {
    /// Field-level validation shared by create and update.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.title.chars().count() > 128 {
            return Err("title is longer than 128 characters".to_string());
        }
        if self.total_amount < 1 {
            return Err("total_amount must be positive".to_string());
        }
        Ok(())
    }
}
