//! OpenAPI specification definition.
//!
//! Aggregates all route handlers and schemas for OpenAPI documentation
//! generation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Authentication
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::get_auth_status,
        // Budgets
        crate::routes::budgets::list_budgets,
        crate::routes::budgets::create_budget,
        crate::routes::budgets::get_budget,
        crate::routes::budgets::update_budget,
        crate::routes::budgets::delete_budget,
        crate::routes::budgets::list_budget_files,
        crate::routes::budgets::upload_budget_files,
        crate::routes::budgets::download_budget_file,
        crate::routes::budgets::delete_budget_file,
        // Bills
        crate::routes::bills::list_bills,
        crate::routes::bills::create_bill,
        crate::routes::bills::get_bill,
        crate::routes::bills::update_bill,
        crate::routes::bills::delete_bill,
        crate::routes::bills::list_bill_files,
        crate::routes::bills::upload_bill_files,
        crate::routes::bills::download_bill_file,
        crate::routes::bills::delete_bill_file,
        // Categories
        crate::routes::categories::list_categories,
        crate::routes::categories::get_category,
        crate::routes::categories::create_category,
        crate::routes::categories::update_category,
        crate::routes::categories::delete_category,
        // Departments
        crate::routes::departments::list_departments,
        crate::routes::departments::get_department,
        crate::routes::departments::create_department,
        crate::routes::departments::update_department,
        crate::routes::departments::delete_department,
        // Catalogs
        crate::routes::catalogs::list_currencies,
        crate::routes::catalogs::get_currency,
        crate::routes::catalogs::create_currency,
        crate::routes::catalogs::update_currency,
        crate::routes::catalogs::delete_currency,
        crate::routes::catalogs::list_transaction_types,
        crate::routes::catalogs::get_transaction_type,
        crate::routes::catalogs::create_transaction_type,
        crate::routes::catalogs::update_transaction_type,
        crate::routes::catalogs::delete_transaction_type,
        crate::routes::catalogs::list_transaction_statuses,
        crate::routes::catalogs::get_transaction_status,
        crate::routes::catalogs::create_transaction_status,
        crate::routes::catalogs::update_transaction_status,
        crate::routes::catalogs::delete_transaction_status,
        // Users
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::create_user,
        crate::routes::users::update_user_departments,
        // Reports
        crate::routes::reports::get_summary,
        // Activity
        crate::routes::activity::list_activity,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(
        schemas(
            crate::routes::MessageResponse,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::LoginResponse,
            crate::routes::auth::AuthStatusResponse,
            crate::routes::budgets::BudgetListResponse,
            crate::routes::budgets::BudgetDetailResponse,
            crate::routes::budgets::UploadResponse,
            crate::routes::bills::BillListResponse,
            crate::routes::bills::BillDetailResponse,
            crate::routes::departments::DepartmentListResponse,
            crate::routes::departments::DepartmentDetailResponse,
            crate::routes::users::UpdateDepartmentsRequest,
            crate::routes::reports::DepartmentSummary,
            crate::routes::reports::TypeSummary,
            crate::routes::reports::StatusSummary,
            crate::routes::reports::SummaryResponse,
            crate::routes::activity::ActivityListResponse,
            crate::models::budget::BudgetPayload,
            crate::models::budget::BudgetResponse,
            crate::models::bill::BillPayload,
            crate::models::bill::BillResponse,
            crate::models::attachment::AttachmentResponse,
            crate::models::activity::ActivityLevel,
            crate::models::activity::ActivityResponse,
            crate::models::catalog::DepartmentRow,
            crate::models::catalog::DepartmentPayload,
            crate::models::catalog::CurrencyRow,
            crate::models::catalog::CurrencyPayload,
            crate::models::catalog::TransactionTypeRow,
            crate::models::catalog::TransactionTypePayload,
            crate::models::catalog::TransactionStatusRow,
            crate::models::catalog::TransactionStatusPayload,
            crate::models::catalog::BillCategoryRow,
            crate::models::catalog::BillCategoryPayload,
            crate::models::user::UserResponse,
            crate::models::user::CreateUserRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Session authentication"),
        (name = "Budgets", description = "Budget records and attachments"),
        (name = "Bills", description = "Bill records and attachments"),
        (name = "Categories", description = "Bill categories"),
        (name = "Departments", description = "Departments"),
        (name = "Catalogs", description = "Currencies, transaction types and statuses"),
        (name = "Users", description = "User management"),
        (name = "Reports", description = "Aggregation reports"),
        (name = "Activity", description = "Activity log"),
        (name = "OpenAPI", description = "API documentation")
    ),
    info(
        title = "Budget Office API",
        description = "Back-office budget and expense tracking API",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Adds the session bearer security scheme to the generated document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Opaque session id issued by /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
