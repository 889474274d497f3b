mod common;

use axum::http::StatusCode;
use common::{dec, id_of, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

async fn create_expense(app: &TestApp, project: &str, name: &str, category: &str, total: i64) -> String {
    let (status, body) = app
        .post(
            "/api/expenses",
            json!({
                "project_id": project,
                "name": name,
                "category": category,
                "supplier": "Sotravo",
                "total_amount": total,
                "expense_date": "2026-08-15",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["payment_status"], json!("non_paye"));
    id_of(&body)
}

#[tokio::test]
async fn payments_drive_totals_and_status() {
    let app = TestApp::new().await;
    let project = app.create_project("Chantier").await;
    let expense = create_expense(&app, &project, "Beton", "construction", 100000).await;

    let (status, body) = app
        .post(
            &format!("/api/expenses/{expense}/payments"),
            json!({ "amount": 40000, "declared_amount": 30000, "payment_method": "virement" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let detail = &body["data"];
    assert_eq!(dec(&detail["total_paid"]), Decimal::from(40_000));
    assert_eq!(dec(&detail["declared_paid"]), Decimal::from(30_000));
    assert_eq!(dec(&detail["undeclared_paid"]), Decimal::from(10_000));
    assert_eq!(dec(&detail["remaining"]), Decimal::from(60_000));
    assert_eq!(detail["payment_status"], json!("partiel"));
    assert_eq!(detail["payments"][0]["payment_method"], json!("virement"));

    let (status, body) = app
        .post(&format!("/api/expenses/{expense}/payments"), json!({ "amount": 60000 }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["payment_status"], json!("paye"));
    assert_eq!(body["data"]["payments"][1]["payment_method"], json!("especes"));

    let (status, body) = app.get(&format!("/api/expenses/{expense}/payments")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn overpayment_and_shrinking_below_paid_are_rejected() {
    let app = TestApp::new().await;
    let project = app.create_project("Limites").await;
    let expense = create_expense(&app, &project, "Notaire", "honoraires", 20000).await;

    let (status, _) = app
        .post(&format!("/api/expenses/{expense}/payments"), json!({ "amount": 15000 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(&format!("/api/expenses/{expense}/payments"), json!({ "amount": 6000 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app
        .post(
            &format!("/api/expenses/{expense}/payments"),
            json!({ "amount": 1000, "declared_amount": 1500 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(&format!("/api/expenses/{expense}"), json!({ "total_amount": 10000 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(
            &format!("/api/expenses/{expense}"),
            json!({ "total_amount": 25000, "name": "Frais de notaire" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], json!("Frais de notaire"));
    assert_eq!(dec(&body["data"]["remaining"]), Decimal::from(10_000));
}

#[tokio::test]
async fn deleting_payments_and_expenses() {
    let app = TestApp::new().await;
    let project = app.create_project("Nettoyage").await;
    let expense = create_expense(&app, &project, "Publicite", "marketing", 8000).await;

    let (_, body) = app
        .post(&format!("/api/expenses/{expense}/payments"), json!({ "amount": 8000 }))
        .await;
    let payment = body["data"]["payments"][0]["id"].as_str().unwrap().to_string();

    let other = create_expense(&app, &project, "Autre", "autre", 500).await;
    let (status, _) = app
        .delete(&format!("/api/expenses/{other}/payments/{payment}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .delete(&format!("/api/expenses/{expense}/payments/{payment}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (_, body) = app.get(&format!("/api/expenses/{expense}")).await;
    assert_eq!(body["data"]["payment_status"], json!("non_paye"));

    let (status, body) = app.delete(&format!("/api/expenses/{expense}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["deleted"], json!(true));
    let (status, _) = app.get(&format!("/api/expenses/{expense}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_category_stats() {
    let app = TestApp::new().await;
    let p1 = app.create_project("P1").await;
    let p2 = app.create_project("P2").await;
    let land = create_expense(&app, &p1, "Terrain Ain Sebaa", "terrain", 500000).await;
    create_expense(&app, &p1, "Fondations", "construction", 200000).await;
    create_expense(&app, &p2, "Elevation", "construction", 100000).await;
    app.post(&format!("/api/expenses/{land}/payments"), json!({ "amount": 500000 }))
        .await;

    let (_, body) = app.get(&format!("/api/expenses?project_id={p1}")).await;
    assert_eq!(body["data"]["total"], json!(2));
    let (_, body) = app.get("/api/expenses?category=construction").await;
    assert_eq!(body["data"]["total"], json!(2));
    assert!(body["data"]["items"][0]["project_name"].is_string());

    let (status, body) = app.get("/api/expenses/stats").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let stats = &body["data"];
    assert_eq!(stats["count"], json!(3));
    assert_eq!(dec(&stats["total_amount"]), Decimal::from(800_000));
    assert_eq!(dec(&stats["total_paid"]), Decimal::from(500_000));
    assert_eq!(dec(&stats["remaining"]), Decimal::from(300_000));

    let categories = stats["by_category"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["category"], json!("terrain"));
    assert_eq!(dec(&categories[0]["total_paid"]), Decimal::from(500_000));
    assert_eq!(categories[1]["category"], json!("construction"));
    assert_eq!(categories[1]["count"], json!(2));
    assert_eq!(dec(&categories[1]["total_amount"]), Decimal::from(300_000));

    let (_, body) = app.get(&format!("/api/expenses/stats?project_id={p2}")).await;
    assert_eq!(body["data"]["count"], json!(1));

    let (_, body) = app.get("/api/expenses/stats?period=custom&end_date=2026-01-01").await;
    assert_eq!(body["data"]["count"], json!(0));
}
