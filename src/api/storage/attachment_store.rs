//! On-disk attachment store.
//!
//! Uploaded files live under the configured upload root, one directory
//! per record: `budgets/{identifier}/{filename}` and
//! `bills/{identifier}/{filename}`. Deleting the last file of a record
//! also removes the record directory.

use super::StorageError;
use std::path::{Path, PathBuf};

/// Result of storing an uploaded file.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// File name as stored on disk (may differ from the upload name on collision).
    pub file_name: String,
    /// Path relative to the upload root, recorded in the database.
    pub relative_path: String,
}

/// Filesystem-backed attachment store.
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The upload root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate an uploaded file name for safe use as a path segment.
    ///
    /// Rejects empty names, path separators, traversal sequences and
    /// hidden-file names.
    pub fn sanitize_file_name(name: &str) -> Result<String, StorageError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(StorageError::InvalidFileName("empty file name".to_string()));
        }
        if name.len() > 255 {
            return Err(StorageError::InvalidFileName(format!(
                "file name too long: {} chars",
                name.len()
            )));
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') || name.contains('\0') {
            return Err(StorageError::InvalidFileName(format!(
                "file name contains path characters: {}",
                name
            )));
        }
        if name.starts_with('.') {
            return Err(StorageError::InvalidFileName(format!(
                "file name starts with dot: {}",
                name
            )));
        }

        Ok(name.to_string())
    }

    /// Store uploaded bytes under `{subdir}/{identifier}/{file_name}`.
    ///
    /// When a file of the same name already exists for the record, a
    /// numeric suffix is inserted before the extension.
    pub async fn save(
        &self,
        subdir: &str,
        identifier: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let file_name = Self::sanitize_file_name(file_name)?;

        let dir = self.root.join(subdir).join(identifier);
        tokio::fs::create_dir_all(&dir).await?;

        let mut candidate = file_name.clone();
        let mut counter = 1u32;
        while tokio::fs::try_exists(dir.join(&candidate)).await? {
            candidate = match file_name.rsplit_once('.') {
                Some((stem, ext)) => format!("{}_{}.{}", stem, counter, ext),
                None => format!("{}_{}", file_name, counter),
            };
            counter += 1;
        }

        tokio::fs::write(dir.join(&candidate), bytes).await?;

        Ok(StoredFile {
            relative_path: format!("{}/{}/{}", subdir, identifier, candidate),
            file_name: candidate,
        })
    }

    /// Read a stored file back as bytes.
    pub async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        Ok(tokio::fs::read(self.root.join(relative_path)).await?)
    }

    /// Remove a stored file, pruning its record directory when empty.
    ///
    /// A file already missing on disk is not an error: the database row
    /// is authoritative and the physical copy may have been cleaned up
    /// out of band.
    pub async fn remove(&self, relative_path: &str) -> Result<(), StorageError> {
        let path = self.root.join(relative_path);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        if let Some(dir) = path.parent() {
            let mut entries = tokio::fs::read_dir(dir).await?;
            if entries.next_entry().await?.is_none() {
                tokio::fs::remove_dir(dir).await?;
            }
        }

        Ok(())
    }
}
