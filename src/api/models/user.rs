//! User accounts and the request-scoped user context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User row as stored. The password hash never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub department_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_row(row: UserRow, department_ids: Vec<i64>) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
            department_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body for user creation (superuser only).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub department_ids: Vec<i64>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        if self.username.chars().count() > 150 {
            return Err("username is longer than 150 characters".to_string());
        }
        if self.password.chars().count() < 8 {
            return Err("password must be at least 8 characters".to_string());
        }
        Ok(())
    }
}

/// The authenticated user attached to a request.
///
/// `department_ids` drives record visibility: superusers see
/// everything, other users only records of their departments.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub department_ids: Vec<i64>,
}

impl CurrentUser {
    /// Departments the user may see, or `None` for unrestricted
    /// (superuser) visibility.
    pub fn department_scope(&self) -> Option<&[i64]> {
        if self.is_superuser {
            None
        } else {
            Some(&self.department_ids)
        }
    }
}
