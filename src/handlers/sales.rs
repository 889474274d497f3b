use super::common::{created, paginated, resolve_period, Deleted, PaginationParams};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::sale::SaleStatus,
    errors::ServiceError,
    services::sales::{
        CreateSaleRequest, SaleDetail, SaleFilter, SaleStatement, SaleStats, SaleSummary,
        UpdateSaleRequest, UpdateSaleStatusRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub project_id: Option<Uuid>,
    pub status: Option<SaleStatus>,
    /// Matches client name or unit number
    pub search: Option<String>,
    /// Named period applied to the sale date
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleStatsQuery {
    pub project_id: Option<Uuid>,
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/stats", get(sale_stats))
        .route("/:id", get(get_sale).put(update_sale).delete(delete_sale))
        .route("/:id/status", put(update_sale_status))
        .route("/:id/statement", get(sale_statement))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/sales",
    params(SaleListQuery),
    responses(
        (status = 200, description = "Sales listed", body = ApiResponse<PaginatedResponse<SaleSummary>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SaleListQuery>,
) -> ApiResult<PaginatedResponse<SaleSummary>> {
    let (page, limit) = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state);
    let filter = SaleFilter {
        project_id: query.project_id,
        status: query.status,
        search: query.search,
        range: resolve_period(query.period, query.start_date, query.end_date)?,
    };
    let (items, total) = state
        .services
        .sales
        .list_sales(user.user_id, filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale created with its schedule", body = ApiResponse<SaleDetail>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unit already sold", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SaleDetail>>), ServiceError> {
    let Json(payload) = payload?;
    let sale = state.services.sales.create_sale(user.user_id, payload).await?;
    Ok(created(sale))
}

#[utoipa::path(
    get,
    path = "/api/sales/:id",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale with its schedule", body = ApiResponse<SaleDetail>),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<SaleDetail> {
    let sale = state.services.sales.get_sale(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    put,
    path = "/api/sales/:id",
    params(("id" = Uuid, Path, description = "Sale ID")),
    request_body = UpdateSaleRequest,
    responses(
        (status = 200, description = "Sale updated", body = ApiResponse<SaleDetail>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unit already sold", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn update_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateSaleRequest>, JsonRejection>,
) -> ApiResult<SaleDetail> {
    let Json(payload) = payload?;
    let sale = state
        .services
        .sales
        .update_sale(user.user_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    put,
    path = "/api/sales/:id/status",
    params(("id" = Uuid, Path, description = "Sale ID")),
    request_body = UpdateSaleStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<SaleDetail>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unit taken by another sale", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn update_sale_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateSaleStatusRequest>, JsonRejection>,
) -> ApiResult<SaleDetail> {
    let Json(payload) = payload?;
    let sale = state
        .services
        .sales
        .update_status(user.user_id, id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

#[utoipa::path(
    delete,
    path = "/api/sales/:id",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn delete_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    state.services.sales.delete_sale(user.user_id, id).await?;
    Ok(Deleted::yes())
}

#[utoipa::path(
    get,
    path = "/api/sales/:id/statement",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Print-ready account statement", body = ApiResponse<SaleStatement>),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn sale_statement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<SaleStatement> {
    let statement = state.services.sales.statement(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(statement)))
}

#[utoipa::path(
    get,
    path = "/api/sales/stats",
    params(SaleStatsQuery),
    responses(
        (status = 200, description = "Sales figures", body = ApiResponse<SaleStats>),
        (status = 400, description = "Invalid period", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn sale_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SaleStatsQuery>,
) -> ApiResult<SaleStats> {
    let range = resolve_period(query.period, query.start_date, query.end_date)?;
    let stats = state
        .services
        .sales
        .stats(user.user_id, query.project_id, range)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}
