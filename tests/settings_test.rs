mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn company_settings_start_blank_then_upsert() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/settings/company").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["company_name"], json!(""));
    assert!(body["data"]["ice"].is_null());

    let (status, body) = app
        .put(
            "/api/settings/company",
            json!({
                "company_name": "Atlas Promotion",
                "address": "12 bd Zerktouni, Casablanca",
                "email": "contact@atlas.ma",
                "ice": "001122334455667",
                "rc": "RC-4521",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let first_id = body["data"]["id"].clone();

    let (status, body) = app
        .put(
            "/api/settings/company",
            json!({ "company_name": "Atlas Promotion SARL", "footer_text": "Merci" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["id"], first_id);
    assert_eq!(body["data"]["company_name"], json!("Atlas Promotion SARL"));
    assert!(body["data"]["ice"].is_null());

    let (_, body) = app.get("/api/settings/company").await;
    assert_eq!(body["data"]["footer_text"], json!("Merci"));
}

#[tokio::test]
async fn company_settings_validate_fields() {
    let app = TestApp::new().await;

    let (status, _) = app
        .put("/api/settings/company", json!({ "company_name": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            "/api/settings/company",
            json!({ "company_name": "X", "email": "not-an-email" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn each_account_has_its_own_letterhead() {
    let app = TestApp::new().await;
    app.put("/api/settings/company", json!({ "company_name": "Premier" }))
        .await;

    let other = app.register_user("second@example.ma").await;
    let (status, body) = app
        .request(
            axum::http::Method::GET,
            "/api/settings/company",
            None,
            Some(&other),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["company_name"], json!(""));
}
