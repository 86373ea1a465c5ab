//! Bill CRUD tests: lifecycle, category filter and the closed-for-edit
//! guard.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn bill_crud_lifecycle() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let payload = common::bill_payload(&state.pool).await;
    let created = server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&payload)
        .await;
    created.assert_status(StatusCode::CREATED);
    let bill: Value = created.json();
    let identifier = bill["identifier"].as_str().unwrap().to_string();
    assert_eq!(bill["title"], json!("Office supplies"));
    assert_eq!(bill["editable"], json!(true));

    let list = server.get("/bills").authorization_bearer(&session).await;
    list.assert_status_ok();
    assert_eq!(list.json::<Value>()["total"], json!(1));

    let mut updated_payload = payload.clone();
    updated_payload["title"] = json!("Office supplies and coffee");
    let updated = server
        .put(&format!("/bills/{}", identifier))
        .authorization_bearer(&session)
        .json(&updated_payload)
        .await;
    updated.assert_status_ok();
    assert_eq!(
        updated.json::<Value>()["title"],
        json!("Office supplies and coffee")
    );

    server
        .delete(&format!("/bills/{}", identifier))
        .authorization_bearer(&session)
        .await
        .assert_status_ok();
    server
        .get(&format!("/bills/{}", identifier))
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_filter_selects_matching_and_uncategorized() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let servicio = common::id_of(&state.pool, "bill_categories", "name", "Servicio").await;
    let viajes = common::id_of(&state.pool, "bill_categories", "name", "Viajes").await;

    let mut in_servicio = common::bill_payload(&state.pool).await;
    in_servicio["title"] = json!("Electricity");
    in_servicio["category_id"] = json!(servicio);
    server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&in_servicio)
        .await
        .assert_status(StatusCode::CREATED);

    let mut in_viajes = common::bill_payload(&state.pool).await;
    in_viajes["title"] = json!("Flight");
    in_viajes["category_id"] = json!(viajes);
    server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&in_viajes)
        .await
        .assert_status(StatusCode::CREATED);

    let mut uncategorized = common::bill_payload(&state.pool).await;
    uncategorized["title"] = json!("Misc");
    server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&uncategorized)
        .await
        .assert_status(StatusCode::CREATED);

    // All three without a filter.
    let all = server.get("/bills").authorization_bearer(&session).await;
    assert_eq!(all.json::<Value>()["total"], json!(3));

    // Category filter.
    let filtered = server
        .get(&format!("/bills?category={}", servicio))
        .authorization_bearer(&session)
        .await;
    let filtered_body: Value = filtered.json();
    assert_eq!(filtered_body["total"], json!(1));
    assert_eq!(filtered_body["items"][0]["title"], json!("Electricity"));

    // Uncategorized filter.
    let none = server
        .get("/bills?category=none")
        .authorization_bearer(&session)
        .await;
    let none_body: Value = none.json();
    assert_eq!(none_body["total"], json!(1));
    assert_eq!(none_body["items"][0]["title"], json!("Misc"));

    // Garbage filter is a validation error.
    server
        .get("/bills?category=abc")
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn closed_bill_rejects_mutation() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let approved_id =
        common::id_of(&state.pool, "transaction_statuses", "name", "Aprobado").await;
    let mut payload = common::bill_payload(&state.pool).await;
    payload["status_id"] = json!(approved_id);

    let created = server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&payload)
        .await;
    created.assert_status(StatusCode::CREATED);
    let bill: Value = created.json();
    assert_eq!(bill["editable"], json!(false));
    let identifier = bill["identifier"].as_str().unwrap();

    server
        .put(&format!("/bills/{}", identifier))
        .authorization_bearer(&session)
        .json(&payload)
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .delete(&format!("/bills/{}", identifier))
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn bill_rejects_unknown_references() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let mut payload = common::bill_payload(&state.pool).await;
    payload["budget_id"] = json!(424242);
    server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&payload)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let mut payload = common::bill_payload(&state.pool).await;
    payload["category_id"] = json!(424242);
    server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&payload)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}
