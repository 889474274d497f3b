#![allow(dead_code)]

use std::str::FromStr;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use promoteur_api::{app_router, config::AppConfig, cors_layer, db, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Harness running the full router over a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    _db_dir: TempDir,
}

impl TestApp {
    /// Fresh database, migrated, with one registered user whose token is used by default.
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("temp dir for test database");
        let db_file = db_dir.path().join("promoteur.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cors = cors_layer(&cfg).expect("cors layer");
        let state = AppState::new(std::sync::Arc::new(pool), cfg);
        let router = app_router(state.clone(), cors);

        let mut app = Self {
            router,
            state,
            token: String::new(),
            _db_dir: db_dir,
        };
        app.token = app.register_user("owner@example.ma").await;
        app
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Registers another account and returns its bearer token.
    pub async fn register_user(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                Some(json!({
                    "name": "Test User",
                    "email": email,
                    "password": "correct-horse-battery",
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["data"]["access_token"]
            .as_str()
            .expect("access token in register response")
            .to_string()
    }

    /// Sends a request and decodes the JSON body (`Value::Null` when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("router error during test request");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, Some(self.token())).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), Some(self.token()))
            .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), Some(self.token()))
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, Some(self.token()))
            .await
    }

    /// Creates a project with 10 lots (6 apartments, 2 garages) and returns its id.
    pub async fn create_project(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/projects",
                json!({
                    "name": name,
                    "location": "Casablanca",
                    "total_surface": 2500,
                    "lot_count": 10,
                    "apartment_count": 6,
                    "garage_count": 2,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        id_of(&body)
    }

    /// Creates an apartment sale priced at 1,000,000 with the given advance.
    pub async fn create_sale(
        &self,
        project_id: &str,
        unit: &str,
        declared: i64,
        undeclared: i64,
    ) -> Value {
        let (status, body) = self
            .post(
                "/api/sales",
                json!({
                    "project_id": project_id,
                    "unit_number": unit,
                    "unit_type": "appartement",
                    "client_name": "Karim Alaoui",
                    "client_phone": "+212600000000",
                    "total_price": 1000000,
                    "sale_date": "2026-09-01",
                    "advance_declared": declared,
                    "advance_undeclared": undeclared,
                    "advance_cash": declared + undeclared,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create sale failed: {body}");
        body
    }
}

/// `data.id` of an envelope.
pub fn id_of(body: &Value) -> String {
    body["data"]["id"]
        .as_str()
        .expect("id in response data")
        .to_string()
}

/// Reads a decimal that may be serialized as a string or a number.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}
