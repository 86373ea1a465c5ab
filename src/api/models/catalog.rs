//! Catalog entities: departments, currencies, transaction types,
//! transaction statuses and bill categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Department row.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct DepartmentRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Department create/update body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DepartmentPayload {
    pub name: String,
}

impl DepartmentPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.name.chars().count() > 32 {
            return Err("name is longer than 32 characters".to_string());
        }
        Ok(())
    }
}

/// Currency row.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct CurrencyRow {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub symbol: String,
}

/// Currency create/update body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CurrencyPayload {
    pub name: String,
    pub code: String,
    pub symbol: String,
}

impl CurrencyPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.name.chars().count() > 32 {
            return Err("name is longer than 32 characters".to_string());
        }
        if self.code.chars().count() != 3 || !self.code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err("code must be a three-letter currency code".to_string());
        }
        if self.symbol.is_empty() || self.symbol.chars().count() > 3 {
            return Err("symbol must be 1 to 3 characters".to_string());
        }
        Ok(())
    }
}

/// Transaction type row (payment channel: transfer, cash, ...).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct TransactionTypeRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction status row. A status with `closes_records` set locks
/// the budgets and bills saved under it.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct TransactionStatusRow {
    pub id: i64,
    pub name: String,
    pub closes_records: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for transaction type create/update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransactionTypePayload {
    pub name: String,
}

impl TransactionTypePayload {
    pub fn validate(&self) -> Result<(), String> {
        validate_catalog_name(&self.name)
    }
}

/// Body for transaction status create/update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransactionStatusPayload {
    pub name: String,
    #[serde(default)]
    pub closes_records: bool,
}

impl TransactionStatusPayload {
    pub fn validate(&self) -> Result<(), String> {
        validate_catalog_name(&self.name)
    }
}

/// Bill category row, optionally nested under a parent category.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct BillCategoryRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub parent_id: Option<i64>,
}

/// Bill category create/update body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BillCategoryPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_id: Option<i64>,
}

impl BillCategoryPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.name.chars().count() > 64 {
            return Err("name is longer than 64 characters".to_string());
        }
        Ok(())
    }
}

fn validate_catalog_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.chars().count() > 32 {
        return Err("name is longer than 32 characters".to_string());
    }
    Ok(())
}
