//! Promoteur API Library
//!
//! Back office for a real-estate developer: projects and their unit
//! inventory, sales with payment schedules, client receipts, project expenses
//! and the cheque register.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use utoipa::ToSchema;

use crate::auth::auth_extension;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires every service over one shared connection.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let auth_service = Arc::new(auth::AuthService::new(
            auth::AuthConfig::from(&config),
            db.clone(),
        ));
        let services = handlers::AppServices::new(db.clone(), auth_service, config.currency.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    pub fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::capture(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: ResponseMeta::capture(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Everything under `/api`. Each resource router gates itself with `with_auth`.
pub fn api_routes() -> Router<AppState> {
    let auth = handlers::auth::public_routes().merge(handlers::auth::account_routes());

    Router::new()
        .route("/status", get(health::api_status))
        .nest("/auth", auth)
        .nest("/projects", handlers::projects::project_routes())
        .nest("/sales", handlers::sales::sale_routes())
        .nest("/payments", handlers::payments::payment_routes())
        .nest("/expenses", handlers::expenses::expense_routes())
        .nest("/checks", handlers::checks::check_routes())
        .nest("/settings", handlers::settings::settings_routes())
}

/// Explicit origins win; otherwise development (or an explicit opt-in) gets a
/// permissive layer and anything else is a configuration error.
pub fn cors_layer(cfg: &config::AppConfig) -> anyhow::Result<CorsLayer> {
    let origins = cfg
        .cors_allowed_origins()
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any));
    }
    if cfg.should_allow_permissive_cors() {
        return Ok(CorsLayer::permissive());
    }
    anyhow::bail!(
        "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
    )
}

/// Full application router: health, `/api`, Swagger UI and the shared layers.
pub fn app_router(state: AppState, cors: CorsLayer) -> Router {
    let auth_service = state.services.auth.clone();

    Router::new()
        .route("/", get(|| async { "promoteur-api up" }))
        .nest("/health", health::health_routes())
        .nest("/api", api_routes())
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Inject AuthService into request extensions for auth middleware
        .layer(auth_extension(auth_service))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

pub mod prelude {
    pub use crate::auth::{AuthService, AuthUser};
    pub use crate::common::*;
    pub use crate::config::*;
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::services::*;
    pub use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};
}
