//! File attachments uploaded against budgets and bills.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Attachment row, shared shape of `budget_files` and `bill_files`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttachmentRow {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttachmentResponse {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<AttachmentRow> for AttachmentResponse {
    fn from(row: AttachmentRow) -> Self {
        Self {
            id: row.id,
            file_name: row.file_name,
            file_path: row.file_path,
            uploaded_at: row.uploaded_at,
        }
    }
}
