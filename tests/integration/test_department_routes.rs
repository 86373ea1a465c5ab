//! Department tests: visibility scoping and the referential delete
//! guard.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn department_crud_lifecycle() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let created = server
        .post("/departments")
        .authorization_bearer(&session)
        .json(&json!({ "name": "FINANZAS" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let department: Value = created.json();
    let id = department["id"].as_i64().unwrap();

    let updated = server
        .put(&format!("/departments/{}", id))
        .authorization_bearer(&session)
        .json(&json!({ "name": "DEPARTAMENTO DE FINANZAS CORPORATIVAS" }))
        .await;
    updated.assert_status(StatusCode::UNPROCESSABLE_ENTITY); // over the 32 character limit

    let updated = server
        .put(&format!("/departments/{}", id))
        .authorization_bearer(&session)
        .json(&json!({ "name": "CONTABILIDAD" }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["name"], json!("CONTABILIDAD"));

    server
        .delete(&format!("/departments/{}", id))
        .authorization_bearer(&session)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn superuser_sees_all_departments() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    let list = server
        .get("/departments")
        .authorization_bearer(&session)
        .await;
    list.assert_status_ok();
    let body: Value = list.json();
    assert_eq!(body["departments"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn regular_user_sees_only_own_departments() {
    let (state, _uploads) = common::test_state().await;
    let wom = common::id_of(&state.pool, "departments", "name", "WOM").await;
    common::create_user(&state.pool, "carol", "carol-password", false, &[wom]).await;

    let server = common::server(&state);
    let session = common::login(&server, "carol", "carol-password").await;

    let list = server
        .get("/departments")
        .authorization_bearer(&session)
        .await;
    list.assert_status_ok();
    let body: Value = list.json();
    let departments = body["departments"].as_array().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0]["name"], json!("WOM"));
}

#[tokio::test]
async fn regular_user_list_visibility_is_scoped() {
    let (state, _uploads) = common::test_state().await;
    let wom = common::id_of(&state.pool, "departments", "name", "WOM").await;
    let entel = common::id_of(&state.pool, "departments", "name", "ENTEL").await;
    common::create_user(&state.pool, "dave", "dave-password", false, &[wom]).await;

    let server = common::server(&state);
    let admin_session = common::login_admin(&server).await;

    // One budget in WOM, one in ENTEL, one with no department.
    for (title, department) in [
        ("In WOM", Some(wom)),
        ("In ENTEL", Some(entel)),
        ("No department", None),
    ] {
        let mut payload = common::budget_payload(&state.pool).await;
        payload["title"] = json!(title);
        payload["department_id"] = json!(department);
        server
            .post("/budgets")
            .authorization_bearer(&admin_session)
            .json(&payload)
            .await
            .assert_status(StatusCode::CREATED);
    }

    // The admin sees all three.
    let admin_list = server
        .get("/budgets")
        .authorization_bearer(&admin_session)
        .await;
    assert_eq!(admin_list.json::<Value>()["total"], json!(3));

    // Dave only sees the WOM budget; departmentless records stay hidden.
    let dave_session = common::login(&server, "dave", "dave-password").await;
    let dave_list = server
        .get("/budgets")
        .authorization_bearer(&dave_session)
        .await;
    let dave_body: Value = dave_list.json();
    assert_eq!(dave_body["total"], json!(1));
    assert_eq!(dave_body["items"][0]["title"], json!("In WOM"));
}

#[tokio::test]
async fn user_without_departments_sees_nothing() {
    let (state, _uploads) = common::test_state().await;
    common::create_user(&state.pool, "erin", "erin-password", false, &[]).await;

    let server = common::server(&state);
    let admin_session = common::login_admin(&server).await;
    server
        .post("/budgets")
        .authorization_bearer(&admin_session)
        .json(&common::budget_payload(&state.pool).await)
        .await
        .assert_status(StatusCode::CREATED);

    let erin_session = common::login(&server, "erin", "erin-password").await;
    let list = server
        .get("/budgets")
        .authorization_bearer(&erin_session)
        .await;
    assert_eq!(list.json::<Value>()["total"], json!(0));
}

#[tokio::test]
async fn department_with_records_cannot_be_deleted() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;
    let wom = common::id_of(&state.pool, "departments", "name", "WOM").await;

    let mut payload = common::budget_payload(&state.pool).await;
    payload["department_id"] = json!(wom);
    server
        .post("/budgets")
        .authorization_bearer(&session)
        .json(&payload)
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete(&format!("/departments/{}", wom))
        .authorization_bearer(&session)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn department_detail_reports_totals() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;
    let wom = common::id_of(&state.pool, "departments", "name", "WOM").await;

    let mut budget = common::budget_payload(&state.pool).await;
    budget["department_id"] = json!(wom);
    budget["total_amount"] = json!(1000);
    server
        .post("/budgets")
        .authorization_bearer(&session)
        .json(&budget)
        .await
        .assert_status(StatusCode::CREATED);

    let mut bill = common::bill_payload(&state.pool).await;
    bill["department_id"] = json!(wom);
    bill["total_amount"] = json!(300);
    server
        .post("/bills")
        .authorization_bearer(&session)
        .json(&bill)
        .await
        .assert_status(StatusCode::CREATED);

    let detail = server
        .get(&format!("/departments/{}", wom))
        .authorization_bearer(&session)
        .await;
    detail.assert_status_ok();
    let body: Value = detail.json();
    assert_eq!(body["budgets_total"], json!(1000));
    assert_eq!(body["bills_total"], json!(300));
    assert_eq!(body["balance"], json!(700));
    assert_eq!(body["budgets_count"], json!(1));
    assert_eq!(body["bills_count"], json!(1));
}
