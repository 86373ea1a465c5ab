//! Shared attachment plumbing for budgets and bills.
//!
//! Both record kinds carry the same attachment surface (upload, list,
//! download, delete); the handlers in `budgets.rs` and `bills.rs`
//! delegate here with their table mapping.

use axum::body::Body;
use axum::extract::Multipart;
use axum::http::{StatusCode, header};
use axum::response::{Json, Response};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use super::{MessageResponse, log_guard_violation};
use crate::models::attachment::{AttachmentResponse, AttachmentRow};
use crate::storage::StorageError;

/// Upload size cap per file.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Table mapping for one attachment-bearing record kind.
pub(crate) struct AttachmentTables {
    pub label: &'static str,
    pub owner_table: &'static str,
    pub files_table: &'static str,
    pub owner_fk: &'static str,
    pub subdir: &'static str,
}

pub(crate) const BUDGET_FILES: AttachmentTables = AttachmentTables {
    label: "budget",
    owner_table: "budgets",
    files_table: "budget_files",
    owner_fk: "budget_id",
    subdir: "budgets",
};

pub(crate) const BILL_FILES: AttachmentTables = AttachmentTables {
    label: "bill",
    owner_table: "bills",
    files_table: "bill_files",
    owner_fk: "bill_id",
    subdir: "bills",
};

/// Attachment row joined with its owning record.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FileWithOwner {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub owner_identifier: String,
    pub owner_editable: bool,
    pub owner_title: String,
}

/// Store every `file` field of a multipart upload against a record.
pub(crate) async fn store_uploads(
    state: &AppState,
    tables: &AttachmentTables,
    owner_id: i64,
    identifier: &str,
    mut multipart: Multipart,
) -> Result<Vec<AttachmentResponse>, ApiError> {
    let mut stored = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read upload: {}", e)))?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::Validation(
                "file exceeds the 10 MiB upload limit".to_string(),
            ));
        }

        let saved = state
            .attachments
            .save(tables.subdir, identifier, &file_name, &bytes)
            .await
            .map_err(|e| match e {
                StorageError::InvalidFileName(msg) => ApiError::Validation(msg),
                other => ApiError::Storage(other),
            })?;

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO {} ({}, file_name, file_path, uploaded_at) VALUES (?, ?, ?, ?)",
            tables.files_table, tables.owner_fk
        );
        let result = sqlx::query(&sql)
            .bind(owner_id)
            .bind(&saved.file_name)
            .bind(&saved.relative_path)
            .bind(now)
            .execute(&state.pool)
            .await?;

        info!(
            "file '{}' added to {} {}",
            saved.file_name, tables.label, identifier
        );

        stored.push(AttachmentResponse {
            id: result.last_insert_rowid(),
            file_name: saved.file_name,
            file_path: saved.relative_path,
            uploaded_at: now,
        });
    }

    if stored.is_empty() {
        return Err(ApiError::Validation(
            "no file fields found in upload".to_string(),
        ));
    }

    Ok(stored)
}

/// List the attachments of a record.
pub(crate) async fn list_files(
    state: &AppState,
    tables: &AttachmentTables,
    owner_id: i64,
) -> Result<Vec<AttachmentResponse>, ApiError> {
    let sql = format!(
        "SELECT id, file_name, file_path, uploaded_at FROM {} WHERE {} = ? ORDER BY uploaded_at, id",
        tables.files_table, tables.owner_fk
    );
    let rows = sqlx::query_as::<_, AttachmentRow>(&sql)
        .bind(owner_id)
        .fetch_all(&state.pool)
        .await?;

    Ok(rows.into_iter().map(AttachmentResponse::from).collect())
}

/// Fetch an attachment together with its owning record.
pub(crate) async fn find_file(
    state: &AppState,
    tables: &AttachmentTables,
    file_id: i64,
) -> Result<FileWithOwner, ApiError> {
    let sql = format!(
        r#"
        SELECT f.id, f.file_name, f.file_path, f.uploaded_at,
               o.identifier AS owner_identifier, o.editable AS owner_editable, o.title AS owner_title
        FROM {files} f
        JOIN {owner} o ON o.id = f.{fk}
        WHERE f.id = ?
        "#,
        files = tables.files_table,
        owner = tables.owner_table,
        fk = tables.owner_fk,
    );

    sqlx::query_as::<_, FileWithOwner>(&sql)
        .bind(file_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Stream an attachment back as a download.
pub(crate) async fn download_file(
    state: &AppState,
    tables: &AttachmentTables,
    file_id: i64,
) -> Result<Response, ApiError> {
    let file = find_file(state, tables, file_id).await?;

    let bytes = state.attachments.read(&file.file_path).await.map_err(|e| {
        if let StorageError::Io(ref io) = e {
            if io.kind() == std::io::ErrorKind::NotFound {
                warn!("stored file missing on disk: {}", file.file_path);
                return ApiError::NotFound;
            }
        }
        ApiError::Storage(e)
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(format!("failed to build download response: {}", e)))
}

/// Delete an attachment row and its file on disk.
///
/// Blocked while the owning record is closed for editing. A missing
/// disk file is logged, not surfaced: the database row is
/// authoritative.
pub(crate) async fn delete_file(
    state: &AppState,
    tables: &AttachmentTables,
    file_id: i64,
    auth: &AuthContext,
) -> Result<Json<MessageResponse>, ApiError> {
    let file = find_file(state, tables, file_id).await?;

    if !file.owner_editable {
        warn!(
            "{} '{}' ({}) is closed, attachment delete rejected (user {})",
            tables.label, file.owner_title, file.owner_identifier, auth.user.username
        );
        log_guard_violation(
            state,
            &format!("{} attachment delete rejected: closed for editing", tables.label),
            &file.owner_identifier,
            auth,
        )
        .await;
        return Err(ApiError::Conflict(format!(
            "{} is closed for editing",
            tables.label
        )));
    }

    let sql = format!("DELETE FROM {} WHERE id = ?", tables.files_table);
    sqlx::query(&sql).bind(file_id).execute(&state.pool).await?;

    if let Err(e) = state.attachments.remove(&file.file_path).await {
        warn!("could not delete stored file '{}': {}", file.file_path, e);
    }

    info!(
        "file '{}' deleted from {} '{}' by {}",
        file.file_name, tables.label, file.owner_title, auth.user.username
    );

    Ok(Json(MessageResponse {
        message: format!("file '{}' deleted", file.file_name),
    }))
}

/// Remove every stored file of a record from disk.
///
/// Called before the owning record is deleted; the rows themselves go
/// away with the record (ON DELETE CASCADE).
pub(crate) async fn remove_record_files(
    state: &AppState,
    tables: &AttachmentTables,
    owner_id: i64,
) -> Result<(), ApiError> {
    for file in list_files(state, tables, owner_id).await? {
        if let Err(e) = state.attachments.remove(&file.file_path).await {
            warn!("could not delete stored file '{}': {}", file.file_path, e);
        }
    }
    Ok(())
}
