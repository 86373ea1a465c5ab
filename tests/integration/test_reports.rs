//! Summary report tests: totals, per-dimension rows and visibility
//! scoping.

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

async fn create_budget(
    server: &axum_test::TestServer,
    session: &str,
    pool: &sqlx::SqlitePool,
    amount: i64,
    department_id: Option<i64>,
) {
    let mut payload = common::budget_payload(pool).await;
    payload["total_amount"] = json!(amount);
    payload["department_id"] = json!(department_id);
    server
        .post("/budgets")
        .authorization_bearer(session)
        .json(&payload)
        .await
        .assert_status(StatusCode::CREATED);
}

async fn create_bill(
    server: &axum_test::TestServer,
    session: &str,
    pool: &sqlx::SqlitePool,
    amount: i64,
    department_id: Option<i64>,
) {
    let mut payload = common::bill_payload(pool).await;
    payload["total_amount"] = json!(amount);
    payload["department_id"] = json!(department_id);
    server
        .post("/bills")
        .authorization_bearer(session)
        .json(&payload)
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn summary_totals_and_balance() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;
    let wom = common::id_of(&state.pool, "departments", "name", "WOM").await;
    let entel = common::id_of(&state.pool, "departments", "name", "ENTEL").await;

    create_budget(&server, &session, &state.pool, 1000, Some(wom)).await;
    create_budget(&server, &session, &state.pool, 500, Some(entel)).await;
    create_bill(&server, &session, &state.pool, 300, Some(wom)).await;

    let summary = server
        .get("/reports/summary")
        .authorization_bearer(&session)
        .await;
    summary.assert_status_ok();
    let body: Value = summary.json();

    assert_eq!(body["total_budgets"], json!(1500));
    assert_eq!(body["total_bills"], json!(300));
    assert_eq!(body["balance"], json!(1200));
    assert_eq!(body["budgets_count"], json!(2));
    assert_eq!(body["bills_count"], json!(1));
    assert_eq!(body["departments_count"], json!(4));

    // Every visible department gets a row, including idle ones.
    let departments = body["departments"].as_array().unwrap();
    assert_eq!(departments.len(), 4);
    let wom_row = departments
        .iter()
        .find(|d| d["department"]["name"] == json!("WOM"))
        .expect("WOM row missing");
    assert_eq!(wom_row["total_budgets"], json!(1000));
    assert_eq!(wom_row["total_bills"], json!(300));
    assert_eq!(wom_row["balance"], json!(700));
    assert_eq!(wom_row["budgets_count"], json!(1));
    assert_eq!(wom_row["bills_count"], json!(1));

    // Only active transaction types show up.
    let types = body["types"].as_array().unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0]["transaction_type"]["name"], json!("Efectivo"));
    assert_eq!(types[0]["budgets"], json!(1500));
    assert_eq!(types[0]["bills"], json!(300));

    // Only active statuses show up (everything defaulted to pending).
    let statuses = body["statuses"].as_array().unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0]["status"]["name"], json!("En espera"));
    assert_eq!(statuses[0]["budgets_count"], json!(2));
    assert_eq!(statuses[0]["bills_count"], json!(1));

    // Recent lists are capped at five.
    assert!(body["recent_budgets"].as_array().unwrap().len() <= 5);
    assert_eq!(body["recent_budgets"].as_array().unwrap().len(), 2);
    assert_eq!(body["recent_bills"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn summary_is_scoped_for_regular_users() {
    let (state, _uploads) = common::test_state().await;
    let wom = common::id_of(&state.pool, "departments", "name", "WOM").await;
    let entel = common::id_of(&state.pool, "departments", "name", "ENTEL").await;
    common::create_user(&state.pool, "kim", "kim-password", false, &[wom]).await;

    let server = common::server(&state);
    let admin_session = common::login_admin(&server).await;

    create_budget(&server, &admin_session, &state.pool, 1000, Some(wom)).await;
    create_budget(&server, &admin_session, &state.pool, 999, Some(entel)).await;
    create_budget(&server, &admin_session, &state.pool, 50, None).await;
    create_bill(&server, &admin_session, &state.pool, 400, Some(wom)).await;

    let kim_session = common::login(&server, "kim", "kim-password").await;
    let summary = server
        .get("/reports/summary")
        .authorization_bearer(&kim_session)
        .await;
    summary.assert_status_ok();
    let body: Value = summary.json();

    // Only WOM records count; the ENTEL and departmentless ones are invisible.
    assert_eq!(body["total_budgets"], json!(1000));
    assert_eq!(body["total_bills"], json!(400));
    assert_eq!(body["balance"], json!(600));
    assert_eq!(body["departments_count"], json!(1));
    assert_eq!(body["recent_budgets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn recent_budgets_are_newest_first_and_capped() {
    let (state, _uploads) = common::test_state().await;
    let server = common::server(&state);
    let session = common::login_admin(&server).await;

    for amount in 1..=7 {
        create_budget(&server, &session, &state.pool, amount, None).await;
    }

    let summary = server
        .get("/reports/summary")
        .authorization_bearer(&session)
        .await;
    let body: Value = summary.json();
    let recent = body["recent_budgets"].as_array().unwrap();
    assert_eq!(recent.len(), 5);
    // Newest first: the last created amount (7) leads.
    assert_eq!(recent[0]["total_amount"], json!(7));
    assert_eq!(recent[4]["total_amount"], json!(3));
}
