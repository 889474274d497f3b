mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{dec, id_of, TestApp};
use rust_decimal::Decimal;
use serde_json::{json, Value};

async fn manual_check(app: &TestApp, body: Value) -> String {
    let (status, response) = app.post("/api/checks", body).await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    assert_eq!(response["data"]["status"], json!("emis"));
    assert_eq!(response["data"]["source"], json!("manuel"));
    id_of(&response)
}

async fn set_status(app: &TestApp, id: &str, status: &str) -> StatusCode {
    app.put(&format!("/api/checks/{id}/status"), json!({ "status": status }))
        .await
        .0
}

#[tokio::test]
async fn lifecycle_allows_only_legal_moves() {
    let app = TestApp::new().await;
    let id = manual_check(
        &app,
        json!({
            "check_type": "emis",
            "check_number": "000123",
            "bank_name": "Banque Populaire",
            "amount": 45000,
            "beneficiary_name": "Sotravo",
        }),
    )
    .await;

    assert_eq!(set_status(&app, &id, "rejete").await, StatusCode::OK);
    assert_eq!(set_status(&app, &id, "encaisse").await, StatusCode::BAD_REQUEST);
    assert_eq!(set_status(&app, &id, "emis").await, StatusCode::OK);
    assert_eq!(set_status(&app, &id, "encaisse").await, StatusCode::OK);

    for next in ["emis", "rejete", "annule"] {
        assert_eq!(set_status(&app, &id, next).await, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .put(&format!("/api/checks/{id}"), json!({ "amount": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&format!("/api/checks/{id}")).await;
    assert_eq!(body["data"]["status"], json!("encaisse"));
}

#[tokio::test]
async fn edits_apply_while_pending() {
    let app = TestApp::new().await;
    let id = manual_check(
        &app,
        json!({ "check_type": "recu", "check_number": "77", "amount": 1000, "drawer_name": "Ali" }),
    )
    .await;

    let (status, body) = app
        .put(
            &format!("/api/checks/{id}"),
            json!({ "amount": 1500, "due_date": "2026-12-01", "notes": "remis au guichet" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(dec(&body["data"]["amount"]), Decimal::from(1500));
    assert_eq!(body["data"]["due_date"], json!("2026-12-01"));

    let (status, _) = app
        .post("/api/checks", json!({ "check_type": "recu", "check_number": " ", "amount": 10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post("/api/checks", json!({ "check_type": "recu", "check_number": "8", "amount": -10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn derived_cheques_must_be_cancelled_before_deletion() {
    let app = TestApp::new().await;
    let project = app.create_project("Cheques").await;
    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "A3",
                "unit_type": "appartement",
                "client_name": "Youssef",
                "total_price": 600000,
                "advance_declared": 60000,
                "advance_cheque": 60000,
                "advance_cheques": [{ "check_number": "SG-9", "amount": 60000 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = id_of(&body);

    let (_, list) = app.get(&format!("/api/checks?sale_id={sale}")).await;
    let derived = list["data"]["items"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(list["data"]["items"][0]["project_id"], json!(project));

    let (status, _) = app.delete(&format!("/api/checks/{derived}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(set_status(&app, &derived, "annule").await, StatusCode::OK);
    let (status, body) = app.delete(&format!("/api/checks/{derived}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let manual = manual_check(
        &app,
        json!({ "check_type": "recu", "check_number": "M-1", "amount": 10, "sale_id": sale }),
    )
    .await;
    let (status, _) = app.delete(&format!("/api/checks/{manual}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn filters_and_stats() {
    let app = TestApp::new().await;
    let soon = (Utc::now().date_naive() + Duration::days(3)).to_string();
    let later = (Utc::now().date_naive() + Duration::days(60)).to_string();

    manual_check(
        &app,
        json!({ "check_type": "recu", "check_number": "R1", "amount": 1000, "due_date": soon }),
    )
    .await;
    manual_check(
        &app,
        json!({ "check_type": "recu", "check_number": "R2", "amount": 2000, "due_date": later }),
    )
    .await;
    let paid = manual_check(
        &app,
        json!({ "check_type": "emis", "check_number": "E1", "amount": 500, "due_date": soon }),
    )
    .await;
    set_status(&app, &paid, "encaisse").await;

    let (_, body) = app.get("/api/checks?check_type=recu").await;
    assert_eq!(body["data"]["total"], json!(2));
    let (_, body) = app.get("/api/checks?status=encaisse").await;
    assert_eq!(body["data"]["total"], json!(1));
    let (status, body) = app.get("/api/checks?period=last_7_days").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total"], json!(0));
    let (_, body) = app
        .get(&format!("/api/checks?start_date={soon}&end_date={soon}"))
        .await;
    assert_eq!(body["data"]["total"], json!(2));

    let (status, body) = app.get("/api/checks/stats").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let stats = &body["data"];
    assert_eq!(stats["total"]["count"], json!(3));
    assert_eq!(dec(&stats["total"]["amount"]), Decimal::from(3500));
    assert_eq!(stats["by_status"]["emis"]["count"], json!(2));
    assert_eq!(stats["by_status"]["encaisse"]["count"], json!(1));
    assert_eq!(dec(&stats["by_type"]["recu"]["amount"]), Decimal::from(3000));
    assert_eq!(dec(&stats["by_type"]["emis"]["amount"]), Decimal::from(500));
    assert_eq!(stats["due_soon"]["count"], json!(1));
    assert_eq!(dec(&stats["due_soon"]["amount"]), Decimal::from(1000));
}

#[tokio::test]
async fn derived_cheques_keep_their_amount() {
    let app = TestApp::new().await;
    let project = app.create_project("Montants").await;
    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "B7",
                "unit_type": "appartement",
                "client_name": "Imane",
                "total_price": 400000,
                "advance_declared": 30000,
                "advance_cheque": 30000,
                "advance_cheques": [{ "check_number": "CIH-4", "amount": 30000 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = id_of(&body);
    let (_, list) = app.get(&format!("/api/checks?sale_id={sale}")).await;
    let derived = list["data"]["items"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/checks/{derived}");

    let (status, _) = app.put(&uri, json!({ "amount": 35000 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(&uri, json!({ "amount": 30000, "bank_name": "CIH Bank" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["bank_name"], json!("CIH Bank"));
    assert_eq!(dec(&body["data"]["amount"]), Decimal::from(30_000));
}
