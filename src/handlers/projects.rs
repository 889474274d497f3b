use super::common::{created, paginated, Deleted, PaginationParams};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::project,
    errors::ServiceError,
    services::projects::{CreateProjectRequest, ProjectStats, UnitInventory, UpdateProjectRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Matches name or location
    pub search: Option<String>,
}

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/stats", get(portfolio_stats))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/units", get(unit_inventory))
        .route("/:id/stats", get(project_stats))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Projects listed", body = ApiResponse<PaginatedResponse<project::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<PaginatedResponse<project::Model>> {
    let (page, limit) = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state);
    let (items, total) = state
        .services
        .projects
        .list_projects(user.user_id, query.search, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ApiResponse<project::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<project::Model>>), ServiceError> {
    let Json(payload) = payload?;
    let project = state
        .services
        .projects
        .create_project(user.user_id, payload)
        .await?;
    Ok(created(project))
}

#[utoipa::path(
    get,
    path = "/api/projects/:id",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project fetched", body = ApiResponse<project::Model>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<project::Model> {
    let project = state.services.projects.get_project(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(project)))
}

#[utoipa::path(
    put,
    path = "/api/projects/:id",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ApiResponse<project::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> ApiResult<project::Model> {
    let Json(payload) = payload?;
    let project = state
        .services
        .projects
        .update_project(user.user_id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

#[utoipa::path(
    delete,
    path = "/api/projects/:id",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project and its sales and expenses deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    state.services.projects.delete_project(user.user_id, id).await?;
    Ok(Deleted::yes())
}

#[utoipa::path(
    get,
    path = "/api/projects/:id/units",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Unit inventory", body = ApiResponse<UnitInventory>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn unit_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<UnitInventory> {
    let inventory = state.services.projects.unit_inventory(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(inventory)))
}

#[utoipa::path(
    get,
    path = "/api/projects/:id/stats",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project figures", body = ApiResponse<ProjectStats>),
        (status = 404, description = "Project not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn project_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ProjectStats> {
    let stats = state.services.projects.project_stats(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/projects/stats",
    responses(
        (status = 200, description = "Figures across every project", body = ApiResponse<ProjectStats>)
    ),
    security(("bearer_auth" = [])),
    tag = "projects"
)]
pub async fn portfolio_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ProjectStats> {
    let stats = state.services.projects.portfolio_stats(user.user_id).await?;
    Ok(Json(ApiResponse::success(stats)))
}
