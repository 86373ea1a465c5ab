//! Activity log entries: an audit record per state-changing request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Severity of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    Info,
    Warning,
    Error,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Info => "INFO",
            ActivityLevel::Warning => "WARNING",
            ActivityLevel::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "INFO" => Some(ActivityLevel::Info),
            "WARNING" => Some(ActivityLevel::Warning),
            "ERROR" => Some(ActivityLevel::Error),
            _ => None,
        }
    }
}

/// Activity log row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub level: String,
    pub action: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub ip_address: Option<String>,
    pub username: Option<String>,
    pub extra_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Activity entry as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityResponse {
    pub id: i64,
    pub level: String,
    pub action: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub ip_address: Option<String>,
    pub username: Option<String>,
    pub extra_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityResponse {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            level: row.level,
            action: row.action,
            method: row.method,
            path: row.path,
            ip_address: row.ip_address,
            username: row.username,
            extra_data: row
                .extra_data
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            created_at: row.created_at,
        }
    }
}

/// Entry to be written to the activity log.
#[derive(Debug, Clone)]
pub struct NewActivityEntry {
    pub level: ActivityLevel,
    pub action: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub ip_address: Option<String>,
    pub username: Option<String>,
    pub extra_data: Option<serde_json::Value>,
}

impl NewActivityEntry {
    /// A WARNING entry for a rejected mutation, tagged with the record
    /// identifier.
    pub fn warning(action: impl Into<String>, identifier: &str, username: Option<String>) -> Self {
        Self {
            level: ActivityLevel::Warning,
            action: action.into(),
            method: None,
            path: None,
            ip_address: None,
            username,
            extra_data: Some(serde_json::json!({ "identifier": identifier })),
        }
    }
}
