use super::common::{created, paginated, resolve_period, Deleted, PaginationParams};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::{expense::ExpenseCategory, expense_payment},
    errors::ServiceError,
    services::expenses::{
        CreateExpenseRequest, ExpenseDetail, ExpenseFilter, ExpenseStats, ExpenseWithTotals,
        RecordExpensePaymentRequest, UpdateExpenseRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub project_id: Option<Uuid>,
    pub category: Option<ExpenseCategory>,
    /// Named period applied to the expense date
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseStatsQuery {
    pub project_id: Option<Uuid>,
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/stats", get(expense_stats))
        .route(
            "/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route(
            "/:id/payments",
            get(list_expense_payments).post(record_expense_payment),
        )
        .route("/:id/payments/:payment_id", delete(delete_expense_payment))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    params(ExpenseListQuery),
    responses(
        (status = 200, description = "Expenses listed with their totals", body = ApiResponse<PaginatedResponse<ExpenseWithTotals>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ExpenseListQuery>,
) -> ApiResult<PaginatedResponse<ExpenseWithTotals>> {
    let (page, limit) = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state);
    let filter = ExpenseFilter {
        project_id: query.project_id,
        category: query.category,
        range: resolve_period(query.period, query.start_date, query.end_date)?,
    };
    let (items, total) = state
        .services
        .expenses
        .list_expenses(user.user_id, filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created", body = ApiResponse<ExpenseWithTotals>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseWithTotals>>), ServiceError> {
    let Json(payload) = payload?;
    let expense = state
        .services
        .expenses
        .create_expense(user.user_id, payload)
        .await?;
    Ok(created(expense))
}

#[utoipa::path(
    get,
    path = "/api/expenses/:id",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense with its payments", body = ApiResponse<ExpenseDetail>),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn get_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ExpenseDetail> {
    let expense = state.services.expenses.get_expense(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(expense)))
}

#[utoipa::path(
    put,
    path = "/api/expenses/:id",
    params(("id" = Uuid, Path, description = "Expense ID")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ApiResponse<ExpenseWithTotals>),
        (status = 400, description = "Total below what was already paid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn update_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> ApiResult<ExpenseWithTotals> {
    let Json(payload) = payload?;
    let expense = state
        .services
        .expenses
        .update_expense(user.user_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(expense)))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/:id",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense and its payments deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    state.services.expenses.delete_expense(user.user_id, id).await?;
    Ok(Deleted::yes())
}

#[utoipa::path(
    get,
    path = "/api/expenses/:id/payments",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Payments of the expense", body = ApiResponse<Vec<expense_payment::Model>>),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn list_expense_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<expense_payment::Model>> {
    let payments = state.services.expenses.list_payments(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(payments)))
}

#[utoipa::path(
    post,
    path = "/api/expenses/:id/payments",
    params(("id" = Uuid, Path, description = "Expense ID")),
    request_body = RecordExpensePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<ExpenseDetail>),
        (status = 400, description = "Invalid split or overpayment", body = crate::errors::ErrorResponse),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn record_expense_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<RecordExpensePaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseDetail>>), ServiceError> {
    let Json(payload) = payload?;
    let expense = state
        .services
        .expenses
        .record_payment(user.user_id, id, payload)
        .await?;
    Ok(created(expense))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/:id/payments/:payment_id",
    params(
        ("id" = Uuid, Path, description = "Expense ID"),
        ("payment_id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment removed", body = ApiResponse<Deleted>),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn delete_expense_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, payment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Deleted> {
    state
        .services
        .expenses
        .delete_payment(user.user_id, id, payment_id)
        .await?;
    Ok(Deleted::yes())
}

#[utoipa::path(
    get,
    path = "/api/expenses/stats",
    params(ExpenseStatsQuery),
    responses(
        (status = 200, description = "Expense figures by category", body = ApiResponse<ExpenseStats>),
        (status = 400, description = "Invalid period", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn expense_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ExpenseStatsQuery>,
) -> ApiResult<ExpenseStats> {
    let range = resolve_period(query.period, query.start_date, query.end_date)?;
    let stats = state
        .services
        .expenses
        .stats(user.user_id, query.project_id, range)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}
