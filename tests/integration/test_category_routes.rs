//! Bill category tests: CRUD, nesting and the delete guards.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn categories_list_is_ordered_by_name() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let list = server
        .get("/categories")
        .authorization_bearer(&session)
        .await;
    list.assert_status_ok();
    let body: Value = list.json();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();

    assert_eq!(names.len(), 10);
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[tokio::test]
async fn category_crud_lifecycle() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let created = server
        .post("/categories")
        .authorization_bearer(&session)
        .json(&json!({ "name": "Arriendo", "description": "Alquileres" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let category: Value = created.json();
    let id = category["id"].as_i64().unwrap();

    let updated = server
        .put(&format!("/categories/{}", id))
        .authorization_bearer(&session)
        .json(&json!({ "name": "Arriendos", "description": "Alquileres y leasing" }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["name"], json!("Arriendos"));

    server
        .delete(&format!("/categories/{}", id))
        .authorization_bearer(&session)
        .await
        .assert_status_ok();
    server
        .get(&format!("/categories/{}", id))
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_with_bills_cannot_be_deleted() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let servicio = common::id_of(&state.pool, "bill_categories", "name", "Servicio").await;
    let mut bill = common::bill_payload(&state.pool).await;
    bill["category_id"] = json!(servicio);
    server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&bill)
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete(&format!("/categories/{}", servicio))
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn category_with_children_cannot_be_deleted() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let parent = common::id_of(&state.pool, "bill_categories", "name", "Servicio").await;
    server
        .post("/categories")
        .authorization_bearer(&session)
        .json(&json!({ "name": "Internet", "parent_id": parent }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete(&format!("/categories/{}", parent))
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn category_cannot_be_its_own_parent() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let servicio = common::id_of(&state.pool, "bill_categories", "name", "Servicio").await;
    server
        .put(&format!("/categories/{}", servicio))
        .authorization_bearer(&session)
        .json(&json!({ "name": "Servicio", "parent_id": servicio }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}
