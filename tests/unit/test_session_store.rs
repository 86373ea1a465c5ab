//! Session store tests against an in-memory database.

#[path = "../common/mod.rs"]
mod common;

use budget_office_api::storage::DbSessionStore;

async fn store_with_user() -> (DbSessionStore, i64) {
    let pool = common::test_pool().await;
    let user_id = common::create_user(&pool, "alice", "password123", false, &[]).await;
    (DbSessionStore::new(pool), user_id)
}

#[tokio::test]
async fn create_and_get_session() {
    let (store, user_id) = store_with_user().await;

    let session = store.create_session(user_id).await.expect("create failed");
    assert_eq!(session.user_id, user_id);
    assert!(session.expires_at > session.created_at);

    let fetched = store
        .get_session(&session.id)
        .await
        .expect("get failed")
        .expect("session missing");
    assert_eq!(fetched.user_id, user_id);
}

#[tokio::test]
async fn unknown_session_is_absent() {
    let (store, _) = store_with_user().await;

    let fetched = store
        .get_session("00000000-0000-0000-0000-000000000000")
        .await
        .expect("get failed");
    assert!(fetched.is_none());
}

#[tokio::test]
async fn revoked_session_is_absent() {
    let (store, user_id) = store_with_user().await;

    let session = store.create_session(user_id).await.expect("create failed");
    store.revoke(&session.id).await.expect("revoke failed");

    assert!(store
        .get_session(&session.id)
        .await
        .expect("get failed")
        .is_none());
}

#[tokio::test]
async fn touch_advances_last_activity() {
    let (store, user_id) = store_with_user().await;

    let session = store.create_session(user_id).await.expect("create failed");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.touch(&session.id).await.expect("touch failed");

    let fetched = store
        .get_session(&session.id)
        .await
        .expect("get failed")
        .expect("session missing");
    assert!(fetched.last_activity >= session.last_activity);
}

#[tokio::test]
async fn purge_removes_only_expired_sessions() {
    let (store, user_id) = store_with_user().await;
    let live = store.create_session(user_id).await.expect("create failed");

    // Live sessions survive a purge.
    let purged = store.purge_expired().await.expect("purge failed");
    assert_eq!(purged, 0);
    assert!(store
        .get_session(&live.id)
        .await
        .expect("get failed")
        .is_some());
}
