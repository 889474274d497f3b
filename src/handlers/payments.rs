use super::common::{created, resolve_period, Deleted};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::payment_plan,
    errors::ServiceError,
    services::{
        payments::{
            CreatePlanRequest, DuePlan, PaymentStats, PlanDetail, RecordPaymentRequest,
            UpdatePlanRequest, UPCOMING_WINDOW_DAYS,
        },
        PaymentSchedule,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpcomingQuery {
    /// Window in days, 30 by default
    pub days: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentStatsQuery {
    /// Named period applied to the payment date
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/sales/:sale_id/plans", get(sale_schedule).post(add_plan))
        .route("/plans/:id", get(get_plan).put(update_plan).delete(delete_plan))
        .route("/plans/:id/cancel", post(cancel_plan))
        .route("/plans/:id/payments", post(record_payment))
        .route("/upcoming", get(upcoming_payments))
        .route("/overdue", get(overdue_payments))
        .route("/stats", get(payment_stats))
        .route("/:payment_id", delete(delete_payment))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/payments/sales/:sale_id/plans",
    params(("sale_id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Schedule with running totals", body = ApiResponse<PaymentSchedule>),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn sale_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sale_id): Path<Uuid>,
) -> ApiResult<PaymentSchedule> {
    let schedule = state.services.payments.schedule(user.user_id, sale_id).await?;
    Ok(Json(ApiResponse::success(schedule)))
}

#[utoipa::path(
    post,
    path = "/api/payments/sales/:sale_id/plans",
    params(("sale_id" = Uuid, Path, description = "Sale ID")),
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Installment added", body = ApiResponse<payment_plan::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Installment number already used", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn add_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sale_id): Path<Uuid>,
    payload: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<payment_plan::Model>>), ServiceError> {
    let Json(payload) = payload?;
    let plan = state
        .services
        .payments
        .add_plan(user.user_id, sale_id, payload)
        .await?;
    Ok(created(plan))
}

#[utoipa::path(
    get,
    path = "/api/payments/plans/:id",
    params(("id" = Uuid, Path, description = "Installment ID")),
    responses(
        (status = 200, description = "Installment with its receipts", body = ApiResponse<PlanDetail>),
        (status = 404, description = "Installment not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn get_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<PlanDetail> {
    let plan = state.services.payments.get_plan(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(plan)))
}

#[utoipa::path(
    put,
    path = "/api/payments/plans/:id",
    params(("id" = Uuid, Path, description = "Installment ID")),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Installment updated", body = ApiResponse<payment_plan::Model>),
        (status = 400, description = "Invalid request or cancelled installment", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn update_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePlanRequest>, JsonRejection>,
) -> ApiResult<payment_plan::Model> {
    let Json(payload) = payload?;
    let plan = state
        .services
        .payments
        .update_plan(user.user_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(plan)))
}

#[utoipa::path(
    delete,
    path = "/api/payments/plans/:id",
    params(("id" = Uuid, Path, description = "Installment ID")),
    responses(
        (status = 200, description = "Installment deleted", body = ApiResponse<Deleted>),
        (status = 400, description = "Installment has receipts", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn delete_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    state.services.payments.delete_plan(user.user_id, id).await?;
    Ok(Deleted::yes())
}

#[utoipa::path(
    post,
    path = "/api/payments/plans/:id/cancel",
    params(("id" = Uuid, Path, description = "Installment ID")),
    responses(
        (status = 200, description = "Installment cancelled", body = ApiResponse<payment_plan::Model>),
        (status = 400, description = "Installment has receipts", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn cancel_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<payment_plan::Model> {
    let plan = state.services.payments.cancel_plan(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(plan)))
}

#[utoipa::path(
    post,
    path = "/api/payments/plans/:id/payments",
    params(("id" = Uuid, Path, description = "Installment ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Receipt recorded", body = ApiResponse<PlanDetail>),
        (status = 400, description = "Invalid split or overpayment", body = crate::errors::ErrorResponse),
        (status = 404, description = "Installment not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PlanDetail>>), ServiceError> {
    let Json(payload) = payload?;
    let plan = state
        .services
        .payments
        .record_payment(user.user_id, id, payload)
        .await?;
    Ok(created(plan))
}

#[utoipa::path(
    delete,
    path = "/api/payments/:payment_id",
    params(("payment_id" = Uuid, Path, description = "Receipt ID")),
    responses(
        (status = 200, description = "Receipt removed", body = ApiResponse<Deleted>),
        (status = 404, description = "Receipt not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> ApiResult<Deleted> {
    state
        .services
        .payments
        .delete_payment(user.user_id, payment_id)
        .await?;
    Ok(Deleted::yes())
}

#[utoipa::path(
    get,
    path = "/api/payments/upcoming",
    params(UpcomingQuery),
    responses(
        (status = 200, description = "Open installments due within the window", body = ApiResponse<Vec<DuePlan>>)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn upcoming_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Vec<DuePlan>> {
    let days = query.days.unwrap_or(UPCOMING_WINDOW_DAYS);
    let plans = state.services.payments.upcoming(user.user_id, days).await?;
    Ok(Json(ApiResponse::success(plans)))
}

#[utoipa::path(
    get,
    path = "/api/payments/overdue",
    responses(
        (status = 200, description = "Installments past their due date", body = ApiResponse<Vec<DuePlan>>)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn overdue_payments(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<DuePlan>> {
    let plans = state.services.payments.overdue(user.user_id).await?;
    Ok(Json(ApiResponse::success(plans)))
}

#[utoipa::path(
    get,
    path = "/api/payments/stats",
    params(PaymentStatsQuery),
    responses(
        (status = 200, description = "Collection figures", body = ApiResponse<PaymentStats>),
        (status = 400, description = "Invalid period", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn payment_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PaymentStatsQuery>,
) -> ApiResult<PaymentStats> {
    let range = resolve_period(query.period, query.start_date, query.end_date)?;
    let stats = state.services.payments.stats(user.user_id, range).await?;
    Ok(Json(ApiResponse::success(stats)))
}
