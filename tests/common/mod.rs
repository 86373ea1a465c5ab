//! Shared test setup: in-memory database, seeded catalogs, a bootstrap
//! superuser and a TestServer over the API router.

#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tempfile::TempDir;

use budget_office_api::routes::{self, AppState};
use budget_office_api::services::seed_service;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Migrated in-memory pool. Single connection so every query sees the
/// same database.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("invalid database url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");
    pool
}

/// Full application state: migrated pool, seeded catalogs, bootstrap
/// superuser, attachments in a temp dir. Keep the returned TempDir
/// alive for the duration of the test.
pub async fn test_state() -> (AppState, TempDir) {
    let pool = test_pool().await;
    seed_service::seed_defaults(&pool)
        .await
        .expect("seeding failed");
    seed_service::ensure_admin_user(&pool, ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("bootstrap superuser failed");

    let uploads = TempDir::new().expect("failed to create upload dir");
    let state = AppState::new(pool, uploads.path().to_path_buf());
    (state, uploads)
}

/// TestServer over the API router with state applied.
pub fn server(state: &AppState) -> TestServer {
    TestServer::new(routes::create_api_router(state.clone()).with_state(state.clone()))
        .expect("failed to start test server")
}

/// Log in and return the session id.
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["session_id"]
        .as_str()
        .expect("session_id missing from login response")
        .to_string()
}

pub async fn login_admin(server: &TestServer) -> String {
    login(server, ADMIN_USERNAME, ADMIN_PASSWORD).await
}

/// Create a regular (non-superuser) user directly in the database and
/// return its id.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    is_superuser: bool,
    department_ids: &[i64],
) -> i64 {
    use budget_office_api::services::password_service;
    use chrono::Utc;

    let hash = password_service::hash_password(password).expect("hashing failed");
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, is_superuser, is_active, created_at, updated_at)
        VALUES (?, '', ?, ?, 1, ?, ?)
        "#,
    )
    .bind(username)
    .bind(hash)
    .bind(is_superuser)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("user insert failed");

    let user_id = result.last_insert_rowid();
    for department_id in department_ids {
        sqlx::query("INSERT INTO user_departments (user_id, department_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(department_id)
            .execute(pool)
            .await
            .expect("membership insert failed");
    }
    user_id
}

/// Id of a seeded catalog row by name-ish lookup.
pub async fn id_of(pool: &SqlitePool, table: &str, name_column: &str, name: &str) -> i64 {
    let sql = format!("SELECT id FROM {} WHERE {} = ?", table, name_column);
    sqlx::query_scalar(&sql)
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("seeded row missing")
}

/// Minimal valid budget payload against the seeded catalogs.
pub async fn budget_payload(pool: &SqlitePool) -> Value {
    let type_id = id_of(pool, "transaction_types", "name", "Efectivo").await;
    let currency_id = id_of(pool, "currencies", "code", "CLP").await;
    json!({
        "title": "Marketing budget",
        "description": "Social media and campaigns",
        "total_amount": 1500,
        "type_id": type_id,
        "currency_id": currency_id,
    })
}

/// Minimal valid bill payload against the seeded catalogs.
pub async fn bill_payload(pool: &SqlitePool) -> Value {
    let type_id = id_of(pool, "transaction_types", "name", "Efectivo").await;
    let currency_id = id_of(pool, "currencies", "code", "CLP").await;
    json!({
        "title": "Office supplies",
        "description": "Paper and toner",
        "total_amount": 200,
        "type_id": type_id,
        "currency_id": currency_id,
    })
}
