//! Payload validation and model conversion tests.

use chrono::Utc;
use uuid::Uuid;

use budget_office_api::models::activity::ActivityLevel;
use budget_office_api::models::budget::{BudgetPayload, BudgetResponse, BudgetRow};
use budget_office_api::models::catalog::{BillCategoryPayload, CurrencyPayload};

fn valid_budget_payload() -> BudgetPayload {
    BudgetPayload {
        title: "Marketing budget".to_string(),
        description: String::new(),
        total_amount: 1500,
        due_date: None,
        status_id: None,
        type_id: 1,
        currency_id: 1,
        department_id: None,
    }
}

#[test]
fn budget_payload_accepts_valid_input() {
    assert!(valid_budget_payload().validate().is_ok());
}

#[test]
fn budget_payload_rejects_empty_title() {
    let mut payload = valid_budget_payload();
    payload.title = "   ".to_string();
    assert!(payload.validate().is_err());
}

#[test]
fn budget_payload_rejects_long_title() {
    let mut payload = valid_budget_payload();
    payload.title = "x".repeat(129);
    assert!(payload.validate().is_err());

    payload.title = "x".repeat(128);
    assert!(payload.validate().is_ok());
}

#[test]
fn budget_payload_rejects_non_positive_amount() {
    let mut payload = valid_budget_payload();
    payload.total_amount = 0;
    assert!(payload.validate().is_err());

    payload.total_amount = -5;
    assert!(payload.validate().is_err());

    payload.total_amount = 1;
    assert!(payload.validate().is_ok());
}

#[test]
fn currency_payload_requires_three_letter_code() {
    let mut payload = CurrencyPayload {
        name: "Chilean Peso".to_string(),
        code: "CLP".to_string(),
        symbol: "$".to_string(),
    };
    assert!(payload.validate().is_ok());

    payload.code = "CLPX".to_string();
    assert!(payload.validate().is_err());

    payload.code = "C1P".to_string();
    assert!(payload.validate().is_err());
}

#[test]
fn category_payload_rejects_empty_name() {
    let payload = BillCategoryPayload {
        name: String::new(),
        description: String::new(),
        parent_id: None,
    };
    assert!(payload.validate().is_err());
}

#[test]
fn activity_level_round_trips() {
    assert_eq!(ActivityLevel::parse("INFO"), Some(ActivityLevel::Info));
    assert_eq!(ActivityLevel::parse("warning"), Some(ActivityLevel::Warning));
    assert_eq!(ActivityLevel::parse("Error"), Some(ActivityLevel::Error));
    assert_eq!(ActivityLevel::parse("debug"), None);
    assert_eq!(ActivityLevel::Warning.as_str(), "WARNING");
}

#[test]
fn budget_response_parses_identifier() {
    let identifier = Uuid::new_v4();
    let now = Utc::now();
    let row = BudgetRow {
        id: 1,
        title: "Budget".to_string(),
        description: String::new(),
        total_amount: 100,
        identifier: identifier.to_string(),
        due_date: None,
        enabled: true,
        editable: true,
        status_id: None,
        type_id: 1,
        currency_id: 1,
        department_id: None,
        created_at: now,
        updated_at: now,
    };

    let response = BudgetResponse::from(row);
    assert_eq!(response.identifier, identifier);
    assert!(response.editable);
}
