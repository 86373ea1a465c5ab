//! Activity log tests: middleware recording of mutating requests and
//! the read endpoint.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn mutating_requests_are_recorded() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    server
        .post("/budgets")
        .authorization_bearer(&session)
        .json(&common::budget_payload(&state.pool).await)
        .await
        .assert_status(StatusCode::CREATED);

    let activity = server
        .get("/activity")
        .authorization_bearer(&session)
        .await;
    activity.assert_status_ok();
    let body: Value = activity.json();
    let entries = body["entries"].as_array().unwrap();

    // The login POST and the budget POST are both on record.
    let actions: Vec<&str> = entries
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert!(actions.iter().any(|a| a.contains("/budgets")));
    assert!(actions.iter().any(|a| a.contains("/auth/login")));

    let budget_entry = entries
        .iter()
        .find(|e| e["action"].as_str().unwrap().contains("/budgets"))
        .unwrap();
    assert_eq!(budget_entry["level"], json!("INFO"));
    assert_eq!(budget_entry["method"], json!("POST"));
    assert_eq!(budget_entry["username"], json!(common::ADMIN_USERNAME));
}

#[tokio::test]
async fn read_requests_are_not_recorded() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let before: i64 = server
        .get("/activity")
        .authorization_bearer(&session)
        .await
        .json::<Value>()["total"]
        .as_i64()
        .unwrap();

    server
        .get("/budgets")
        .authorization_bearer(&session)
        .await
        .assert_status_ok();
    server
        .get("/departments")
        .authorization_bearer(&session)
        .await
        .assert_status_ok();

    let after: i64 = server
        .get("/activity")
        .authorization_bearer(&session)
        .await
        .json::<Value>()["total"]
        .as_i64()
        .unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn client_ip_is_taken_from_forwarded_header() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    server
        .post("/departments")
        .authorization_bearer(&session)
        .add_header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .json(&json!({ "name": "SOPORTE" }))
        .await
        .assert_status(StatusCode::CREATED);

    let activity = server
        .get("/activity")
        .authorization_bearer(&session)
        .await;
    let body: Value = activity.json();
    let entry = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["action"].as_str().unwrap().contains("/departments"))
        .expect("department POST not recorded");
    assert_eq!(entry["ip_address"], json!("203.0.113.7"));
}

#[tokio::test]
async fn level_filter_and_validation() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    // Provoke a WARNING: delete a budget that is closed.
    let approved = common::id_of(&state.pool, "transaction_statuses", "name", "Aprobado").await;
    let mut payload = common::budget_payload(&state.pool).await;
    payload["status_id"] = json!(approved);
    let budget: Value = server
        .post("/budgets")
        .authorization_bearer(&session)
        .json(&payload)
        .await
        .json();
    server
        .delete(&format!("/budgets/{}", budget["identifier"].as_str().unwrap()))
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::CONFLICT);

    let warnings = server
        .get("/activity?level=WARNING")
        .authorization_bearer(&session)
        .await;
    warnings.assert_status_ok();
    let body: Value = warnings.json();
    assert!(body["total"].as_i64().unwrap() >= 1);
    for entry in body["entries"].as_array().unwrap() {
        assert_eq!(entry["level"], json!("WARNING"));
    }
    // Guard entries carry the record identifier.
    let guard_entry = &body["entries"][0];
    assert_eq!(
        guard_entry["extra_data"]["identifier"],
        budget["identifier"]
    );

    // Invalid level filter.
    server
        .get("/activity?level=NOISE")
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pagination_limits_results() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    for i in 0..4 {
        server
            .post("/departments")
            .authorization_bearer(&session)
            .json(&json!({ "name": format!("DEPT-{}", i) }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let page = server
        .get("/activity?limit=2&offset=0")
        .authorization_bearer(&session)
        .await;
    let body: Value = page.json();
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
    assert_eq!(body["limit"], json!(2));
    assert!(body["total"].as_i64().unwrap() >= 5);
}
