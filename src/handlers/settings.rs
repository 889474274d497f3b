use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::company_settings,
    services::settings::UpdateCompanySettingsRequest,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/company", get(get_company).put(update_company))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/settings/company",
    responses(
        (status = 200, description = "Company letterhead, blank when never saved", body = ApiResponse<company_settings::Model>)
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn get_company(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<company_settings::Model> {
    let settings = state.services.settings.get_company(user.user_id).await?;
    Ok(Json(ApiResponse::success(settings)))
}

#[utoipa::path(
    put,
    path = "/api/settings/company",
    request_body = UpdateCompanySettingsRequest,
    responses(
        (status = 200, description = "Company letterhead saved", body = ApiResponse<company_settings::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn update_company(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<UpdateCompanySettingsRequest>, JsonRejection>,
) -> ApiResult<company_settings::Model> {
    let Json(payload) = payload?;
    let settings = state
        .services
        .settings
        .upsert_company(user.user_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(settings)))
}
