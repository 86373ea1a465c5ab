//! Attachment store tests: save, collision handling, delete and
//! empty-directory pruning.

use tempfile::TempDir;

use budget_office_api::storage::{AttachmentStore, StorageError};

fn store() -> (AttachmentStore, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    (AttachmentStore::new(dir.path().to_path_buf()), dir)
}

#[test]
fn sanitize_rejects_path_characters() {
    assert!(AttachmentStore::sanitize_file_name("invoice.pdf").is_ok());
    assert!(AttachmentStore::sanitize_file_name("").is_err());
    assert!(AttachmentStore::sanitize_file_name("../etc/passwd").is_err());
    assert!(AttachmentStore::sanitize_file_name("a/b.pdf").is_err());
    assert!(AttachmentStore::sanitize_file_name("a\\b.pdf").is_err());
    assert!(AttachmentStore::sanitize_file_name(".hidden").is_err());
}

#[tokio::test]
async fn save_and_read_round_trip() {
    let (store, _dir) = store();

    let saved = store
        .save("budgets", "abc-123", "invoice.pdf", b"dummy file content")
        .await
        .expect("save failed");
    assert_eq!(saved.file_name, "invoice.pdf");
    assert_eq!(saved.relative_path, "budgets/abc-123/invoice.pdf");

    let bytes = store.read(&saved.relative_path).await.expect("read failed");
    assert_eq!(bytes, b"dummy file content");
}

#[tokio::test]
async fn name_collisions_get_numeric_suffix() {
    let (store, _dir) = store();

    let first = store
        .save("budgets", "abc", "doc.pdf", b"one")
        .await
        .expect("save failed");
    let second = store
        .save("budgets", "abc", "doc.pdf", b"two")
        .await
        .expect("save failed");

    assert_eq!(first.file_name, "doc.pdf");
    assert_eq!(second.file_name, "doc_1.pdf");
    assert_eq!(
        store.read(&first.relative_path).await.expect("read failed"),
        b"one"
    );
    assert_eq!(
        store.read(&second.relative_path).await.expect("read failed"),
        b"two"
    );
}

#[tokio::test]
async fn remove_prunes_empty_record_directory() {
    let (store, dir) = store();

    let saved = store
        .save("bills", "rec-1", "receipt.png", b"bytes")
        .await
        .expect("save failed");

    let record_dir = dir.path().join("bills").join("rec-1");
    assert!(record_dir.exists());

    store.remove(&saved.relative_path).await.expect("remove failed");
    assert!(!record_dir.exists());
}

#[tokio::test]
async fn remove_keeps_directory_with_remaining_files() {
    let (store, dir) = store();

    let first = store
        .save("bills", "rec-2", "a.txt", b"a")
        .await
        .expect("save failed");
    store
        .save("bills", "rec-2", "b.txt", b"b")
        .await
        .expect("save failed");

    store.remove(&first.relative_path).await.expect("remove failed");

    let record_dir = dir.path().join("bills").join("rec-2");
    assert!(record_dir.exists());
    assert!(record_dir.join("b.txt").exists());
}

#[tokio::test]
async fn remove_of_missing_file_is_ok() {
    let (store, _dir) = store();
    store
        .remove("budgets/none/gone.pdf")
        .await
        .expect("missing file should not error");
}

#[tokio::test]
async fn save_rejects_traversal_name() {
    let (store, _dir) = store();
    let err = store
        .save("budgets", "abc", "../escape.pdf", b"x")
        .await
        .expect_err("traversal name must be rejected");
    assert!(matches!(err, StorageError::InvalidFileName(_)));
}
