use super::common::{created, paginated, resolve_period, Deleted, PaginationParams};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::check::{self, CheckStatus, CheckType},
    errors::ServiceError,
    services::checks::{
        CheckFilter, CheckStats, CreateCheckRequest, UpdateCheckRequest, UpdateCheckStatusRequest,
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
pub struct CheckListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub check_type: Option<CheckType>,
    pub status: Option<CheckStatus>,
    pub project_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    /// Named period applied to the due date, or the issue date when undated
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn check_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_checks).post(create_check))
        .route("/stats", get(check_stats))
        .route("/:id", get(get_check).put(update_check).delete(delete_check))
        .route("/:id/status", put(update_check_status))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/checks",
    params(CheckListQuery),
    responses(
        (status = 200, description = "Cheques listed", body = ApiResponse<PaginatedResponse<check::Model>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "checks"
)]
pub async fn list_checks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CheckListQuery>,
) -> ApiResult<PaginatedResponse<check::Model>> {
    let (page, limit) = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state);
    let filter = CheckFilter {
        check_type: query.check_type,
        status: query.status,
        project_id: query.project_id,
        sale_id: query.sale_id,
        range: resolve_period(query.period, query.start_date, query.end_date)?,
    };
    let (items, total) = state
        .services
        .checks
        .list_checks(user.user_id, filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    post,
    path = "/api/checks",
    request_body = CreateCheckRequest,
    responses(
        (status = 201, description = "Cheque registered", body = ApiResponse<check::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced project, sale or expense not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "checks"
)]
pub async fn create_check(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateCheckRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<check::Model>>), ServiceError> {
    let Json(payload) = payload?;
    let check = state.services.checks.create_check(user.user_id, payload).await?;
    Ok(created(check))
}

#[utoipa::path(
    get,
    path = "/api/checks/:id",
    params(("id" = Uuid, Path, description = "Cheque ID")),
    responses(
        (status = 200, description = "Cheque fetched", body = ApiResponse<check::Model>),
        (status = 404, description = "Cheque not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "checks"
)]
pub async fn get_check(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<check::Model> {
    let check = state.services.checks.get_check(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(check)))
}

#[utoipa::path(
    put,
    path = "/api/checks/:id",
    params(("id" = Uuid, Path, description = "Cheque ID")),
    request_body = UpdateCheckRequest,
    responses(
        (status = 200, description = "Cheque updated", body = ApiResponse<check::Model>),
        (status = 400, description = "Cheque no longer editable", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "checks"
)]
pub async fn update_check(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCheckRequest>, JsonRejection>,
) -> ApiResult<check::Model> {
    let Json(payload) = payload?;
    let check = state
        .services
        .checks
        .update_check(user.user_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(check)))
}

#[utoipa::path(
    put,
    path = "/api/checks/:id/status",
    params(("id" = Uuid, Path, description = "Cheque ID")),
    request_body = UpdateCheckStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<check::Model>),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "checks"
)]
pub async fn update_check_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCheckStatusRequest>, JsonRejection>,
) -> ApiResult<check::Model> {
    let Json(payload) = payload?;
    let check = state
        .services
        .checks
        .update_status(user.user_id, id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(check)))
}

#[utoipa::path(
    delete,
    path = "/api/checks/:id",
    params(("id" = Uuid, Path, description = "Cheque ID")),
    responses(
        (status = 200, description = "Cheque deleted", body = ApiResponse<Deleted>),
        (status = 400, description = "Derived cheque still active", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "checks"
)]
pub async fn delete_check(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    state.services.checks.delete_check(user.user_id, id).await?;
    Ok(Deleted::yes())
}

#[utoipa::path(
    get,
    path = "/api/checks/stats",
    responses(
        (status = 200, description = "Cheque register figures", body = ApiResponse<CheckStats>)
    ),
    security(("bearer_auth" = [])),
    tag = "checks"
)]
pub async fn check_stats(State(state): State<AppState>, user: AuthUser) -> ApiResult<CheckStats> {
    let stats = state.services.checks.stats(user.user_id).await?;
    Ok(Json(ApiResponse::success(stats)))
}
