use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth, entities, handlers, health,
    services::{checks, expenses, payments, projects, reconciliation, sales, settings},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Promoteur API",
        version = "1.0.0",
        description = r#"
# Real-estate developer back office

Projects, unit sales with their payment schedules, client receipts, project
expenses and the cheque register.

## Authentication

Register or log in under `/api/auth`, then send the returned token:

```
Authorization: Bearer <your-jwt-token>
```

## Envelope

Every response is wrapped as `{ success, data, error, meta }`. Paginated lists
return `data = { items, total, page, limit, total_pages }`.

## Periods

List and stats endpoints accept `period` (today, yesterday, this_week,
last_week, this_month, last_month, this_quarter, this_year, last_year,
last_7_days, last_30_days, all, custom) with `start_date`/`end_date`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Accounts and tokens"),
        (name = "projects", description = "Projects, unit inventory and figures"),
        (name = "sales", description = "Unit sales, schedules and statements"),
        (name = "payments", description = "Installments and client receipts"),
        (name = "expenses", description = "Project expenses and their payments"),
        (name = "checks", description = "Cheque register"),
        (name = "settings", description = "Company letterhead"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::auth::update_me,
        handlers::auth::change_password,

        handlers::projects::list_projects,
        handlers::projects::create_project,
        handlers::projects::get_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::projects::unit_inventory,
        handlers::projects::project_stats,
        handlers::projects::portfolio_stats,

        handlers::sales::list_sales,
        handlers::sales::create_sale,
        handlers::sales::get_sale,
        handlers::sales::update_sale,
        handlers::sales::update_sale_status,
        handlers::sales::delete_sale,
        handlers::sales::sale_statement,
        handlers::sales::sale_stats,

        handlers::payments::sale_schedule,
        handlers::payments::add_plan,
        handlers::payments::get_plan,
        handlers::payments::update_plan,
        handlers::payments::delete_plan,
        handlers::payments::cancel_plan,
        handlers::payments::record_payment,
        handlers::payments::delete_payment,
        handlers::payments::upcoming_payments,
        handlers::payments::overdue_payments,
        handlers::payments::payment_stats,

        handlers::expenses::list_expenses,
        handlers::expenses::create_expense,
        handlers::expenses::get_expense,
        handlers::expenses::update_expense,
        handlers::expenses::delete_expense,
        handlers::expenses::list_expense_payments,
        handlers::expenses::record_expense_payment,
        handlers::expenses::delete_expense_payment,
        handlers::expenses::expense_stats,

        handlers::checks::list_checks,
        handlers::checks::create_check,
        handlers::checks::get_check,
        handlers::checks::update_check,
        handlers::checks::update_check_status,
        handlers::checks::delete_check,
        handlers::checks::check_stats,

        handlers::settings::get_company,
        handlers::settings::update_company,

        health::liveness_check,
        health::readiness_check,
        health::api_status,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::ChangePasswordRequest,
            auth::UpdateProfileRequest,
            auth::UserResponse,
            auth::TokenResponse,

            entities::project::Model,
            entities::sale::Model,
            entities::sale::UnitType,
            entities::sale::SaleStatus,
            entities::payment_plan::Model,
            entities::payment_plan::PaymentPlanStatus,
            entities::payment::Model,
            entities::payment::PaymentMethod,
            entities::expense::Model,
            entities::expense::ExpenseCategory,
            entities::expense_payment::Model,
            entities::check::Model,
            entities::check::CheckType,
            entities::check::CheckStatus,
            entities::check::CheckSource,
            entities::company_settings::Model,

            reconciliation::AmountSplit,
            reconciliation::ScheduleEntry,
            reconciliation::ScheduleTotals,
            reconciliation::PaymentSchedule,

            projects::CreateProjectRequest,
            projects::UpdateProjectRequest,
            projects::UnitInventory,
            projects::ProjectStats,
            sales::CreateSaleRequest,
            sales::UpdateSaleRequest,
            sales::UpdateSaleStatusRequest,
            sales::InstallmentInput,
            sales::SaleSummary,
            sales::SaleDetail,
            sales::SaleStatement,
            sales::SaleStats,
            payments::CreatePlanRequest,
            payments::UpdatePlanRequest,
            payments::RecordPaymentRequest,
            payments::PlanDetail,
            payments::DuePlan,
            payments::PaymentStats,
            expenses::CreateExpenseRequest,
            expenses::UpdateExpenseRequest,
            expenses::RecordExpensePaymentRequest,
            expenses::ExpenseWithTotals,
            expenses::ExpenseDetail,
            expenses::ExpenseStats,
            checks::ChequeInput,
            checks::CreateCheckRequest,
            checks::UpdateCheckRequest,
            checks::UpdateCheckStatusRequest,
            checks::CheckStats,
            settings::UpdateCompanySettingsRequest,

            handlers::common::Deleted,
            crate::ResponseMeta,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
