mod common;

use axum::http::StatusCode;
use common::{dec, id_of, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn advance_counts_as_paid_and_shows_as_installment_zero() {
    let app = TestApp::new().await;
    let project = app.create_project("Avances").await;

    let body = app.create_sale(&project, "A1", 120000, 30000).await;
    let sale = &body["data"];
    assert_eq!(sale["status"], json!("en_cours"));
    assert_eq!(sale["project_name"], json!("Avances"));
    assert_eq!(dec(&sale["advance_total"]), Decimal::from(150_000));
    assert_eq!(dec(&sale["total_paid"]), Decimal::from(150_000));
    assert_eq!(dec(&sale["remaining"]), Decimal::from(850_000));
    assert_eq!(dec(&sale["progress"]), Decimal::from(15));

    let entries = sale["schedule"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    let initial = &entries[0];
    assert_eq!(initial["installment_number"], json!(0));
    assert_eq!(initial["is_virtual"], json!(true));
    assert!(initial["id"].is_null());
    assert_eq!(initial["status"], json!("paye"));
    assert_eq!(dec(&initial["declared_amount"]), Decimal::from(120_000));
    assert_eq!(dec(&initial["undeclared_amount"]), Decimal::from(30_000));
    assert_eq!(initial["payment_method"], json!("especes"));

    let totals = &sale["schedule"]["totals"];
    assert_eq!(dec(&totals["total_paid"]), Decimal::from(150_000));
    assert_eq!(dec(&totals["declared_paid"]), Decimal::from(120_000));
    assert_eq!(dec(&totals["undeclared_paid"]), Decimal::from(30_000));
}

#[tokio::test]
async fn sale_without_advance_has_an_empty_schedule() {
    let app = TestApp::new().await;
    let project = app.create_project("Sans avance").await;

    let body = app.create_sale(&project, "A1", 0, 0).await;
    assert!(body["data"]["schedule"]["entries"].as_array().unwrap().is_empty());
    assert_eq!(dec(&body["data"]["total_paid"]), Decimal::ZERO);
}

#[tokio::test]
async fn installments_and_advance_cheques_are_created_with_the_sale() {
    let app = TestApp::new().await;
    let project = app.create_project("Echeancier").await;

    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "G1",
                "unit_type": "garage",
                "client_name": "Nadia Tazi",
                "total_price": 300000,
                "sale_date": "2026-09-10",
                "advance_declared": 50000,
                "advance_cheque": 50000,
                "advance_cheques": [
                    { "check_number": "CHQ-001", "bank_name": "Attijariwafa", "amount": 50000 }
                ],
                "installments": [
                    { "installment_number": 1, "due_date": "2099-01-15", "planned_amount": 100000 },
                    { "installment_number": 2, "due_date": "2099-06-15", "planned_amount": 150000 }
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let entries = body["data"]["schedule"]["entries"].as_array().unwrap();
    let numbers: Vec<_> = entries.iter().map(|e| e["installment_number"].clone()).collect();
    assert_eq!(numbers, vec![json!(0), json!(1), json!(2)]);
    assert_eq!(entries[0]["payment_method"], json!("cheque"));
    assert_eq!(entries[1]["status"], json!("planifie"));
    assert_eq!(dec(&body["data"]["schedule"]["totals"]["total_planned"]), Decimal::from(300_000));

    let (status, checks) = app.get("/api/checks").await;
    assert_eq!(status, StatusCode::OK, "{checks}");
    assert_eq!(checks["data"]["total"], json!(1));
    let cheque = &checks["data"]["items"][0];
    assert_eq!(cheque["check_type"], json!("recu"));
    assert_eq!(cheque["source"], json!("avance_vente"));
    assert_eq!(cheque["drawer_name"], json!("Nadia Tazi"));
    assert_eq!(cheque["sale_id"], json!(id_of(&body)));
}

#[tokio::test]
async fn advance_rules_are_enforced() {
    let app = TestApp::new().await;
    let project = app.create_project("Regles").await;

    let base = |extra: serde_json::Value| {
        let mut body = json!({
            "project_id": project,
            "unit_number": "A9",
            "unit_type": "appartement",
            "client_name": "Client",
            "total_price": 500000,
        });
        for (k, v) in extra.as_object().unwrap() {
            body[k] = v.clone();
        }
        body
    };

    let (status, _) = app
        .post("/api/sales", base(json!({ "advance_declared": 600000 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/sales",
            base(json!({ "advance_declared": 100000, "advance_cash": 60000, "advance_cheque": 10000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/sales", base(json!({ "total_price": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_unit_can_only_be_sold_once_while_active() {
    let app = TestApp::new().await;
    let project = app.create_project("Unicite").await;
    let first = app.create_sale(&project, "A1", 0, 0).await;

    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "A1",
                "unit_type": "appartement",
                "client_name": "Second",
                "total_price": 900000,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = app
        .put(
            &format!("/api/sales/{}/status", id_of(&first)),
            json!({ "status": "annule" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let second = app.create_sale(&project, "A1", 0, 0).await;

    // The unit is taken again, so the cancelled sale cannot come back.
    let (status, _) = app
        .put(
            &format!("/api/sales/{}/status", id_of(&first)),
            json!({ "status": "en_cours" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .put(
            &format!("/api/sales/{}", id_of(&second)),
            json!({ "unit_number": "A2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .put(
            &format!("/api/sales/{}/status", id_of(&first)),
            json!({ "status": "en_cours" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn status_transitions_follow_the_lifecycle() {
    let app = TestApp::new().await;
    let project = app.create_project("Cycle").await;
    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "V1",
                "unit_type": "villa",
                "client_name": "Omar",
                "total_price": 2000000,
                "installments": [
                    { "installment_number": 1, "due_date": "2099-03-01", "planned_amount": 500000 }
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = id_of(&body);

    let (status, body) = app
        .put(&format!("/api/sales/{sale}/status"), json!({ "status": "annule" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], json!("annule"));
    assert_eq!(body["data"]["schedule"]["entries"][0]["status"], json!("annule"));

    let (status, _) = app
        .put(&format!("/api/sales/{sale}/status"), json!({ "status": "termine" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(&format!("/api/sales/{sale}/status"), json!({ "status": "en_cours" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .put(&format!("/api/sales/{sale}/status"), json!({ "status": "termine" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .put(&format!("/api/sales/{sale}/status"), json!({ "status": "en_cours" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_and_stats() {
    let app = TestApp::new().await;
    let p1 = app.create_project("Un").await;
    let p2 = app.create_project("Deux").await;
    app.create_sale(&p1, "A1", 100000, 0).await;
    app.create_sale(&p1, "A2", 0, 50000).await;
    let cancelled = app.create_sale(&p2, "A1", 200000, 0).await;
    app.put(
        &format!("/api/sales/{}/status", id_of(&cancelled)),
        json!({ "status": "annule" }),
    )
    .await;

    let (_, body) = app.get(&format!("/api/sales?project_id={p1}")).await;
    assert_eq!(body["data"]["total"], json!(2));

    let (_, body) = app.get("/api/sales?status=annule").await;
    assert_eq!(body["data"]["total"], json!(1));

    let (_, body) = app.get("/api/sales?search=A2").await;
    assert_eq!(body["data"]["total"], json!(1));

    let (status, body) = app
        .get("/api/sales?period=custom&start_date=2026-01-01&end_date=2026-12-31")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total"], json!(3));

    let (status, _) = app.get("/api/sales?period=custom").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .get("/api/sales?start_date=2026-12-31&end_date=2026-01-01")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = app.get("/api/sales?start_date=2027-01-01").await;
    assert_eq!(body["data"]["total"], json!(0));

    let (status, body) = app.get("/api/sales/stats").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let stats = &body["data"];
    assert_eq!(stats["count"], json!(3));
    assert_eq!(stats["by_status"]["en_cours"], json!(2));
    assert_eq!(stats["by_status"]["annule"], json!(1));
    assert_eq!(dec(&stats["total_value"]), Decimal::from(2_000_000));
    assert_eq!(dec(&stats["average_price"]), Decimal::from(1_000_000));
    assert_eq!(dec(&stats["total_advance"]), Decimal::from(150_000));
    assert_eq!(dec(&stats["collected"]["declared"]), Decimal::from(100_000));
    assert_eq!(dec(&stats["collected"]["undeclared"]), Decimal::from(50_000));
}

#[tokio::test]
async fn statement_bundles_company_project_and_schedule() {
    let app = TestApp::new().await;
    let project = app.create_project("Releve").await;
    let sale = app.create_sale(&project, "A1", 100000, 0).await;
    app.put(
        "/api/settings/company",
        json!({ "company_name": "Promo Atlas SARL", "ice": "001234567000089" }),
    )
    .await;

    let (status, body) = app
        .get(&format!("/api/sales/{}/statement", id_of(&sale)))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let statement = &body["data"];
    assert_eq!(statement["company"]["company_name"], json!("Promo Atlas SARL"));
    assert_eq!(statement["project"]["name"], json!("Releve"));
    assert_eq!(statement["sale"]["unit_number"], json!("A1"));
    assert_eq!(statement["currency"], json!("MAD"));
    assert_eq!(statement["schedule"]["entries"][0]["is_virtual"], json!(true));
}

#[tokio::test]
async fn deleting_a_sale_removes_its_cheques() {
    let app = TestApp::new().await;
    let project = app.create_project("Suppression").await;
    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "L1",
                "unit_type": "local",
                "client_name": "Hassan",
                "total_price": 400000,
                "advance_declared": 40000,
                "advance_cheque": 40000,
                "advance_cheques": [{ "check_number": "X-1", "amount": 40000 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = id_of(&body);

    let (status, body) = app.delete(&format!("/api/sales/{sale}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["deleted"], json!(true));

    let (status, _) = app.get(&format!("/api/sales/{sale}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, checks) = app.get("/api/checks").await;
    assert_eq!(checks["data"]["total"], json!(0));
}

#[tokio::test]
async fn deleting_a_sale_keeps_manual_cheques() {
    let app = TestApp::new().await;
    let project = app.create_project("Manuels").await;
    let sale = id_of(&app.create_sale(&project, "B2", 50000, 0).await);

    let (status, body) = app
        .post(
            "/api/checks",
            json!({ "check_type": "recu", "check_number": "MAN-1", "amount": 5000, "sale_id": sale }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let manual = id_of(&body);

    let (status, _) = app.delete(&format!("/api/sales/{sale}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/api/checks/{manual}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["source"], json!("manuel"));
    assert!(body["data"]["sale_id"].is_null());
}

#[tokio::test]
async fn deleting_a_project_keeps_manual_cheques_of_its_sales() {
    let app = TestApp::new().await;
    let project = app.create_project("Projet supprime").await;
    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "C4",
                "unit_type": "appartement",
                "client_name": "Salma",
                "total_price": 500000,
                "advance_declared": 20000,
                "advance_cheque": 20000,
                "advance_cheques": [{ "check_number": "AV-1", "amount": 20000 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = id_of(&body);
    let (status, body) = app
        .post(
            "/api/checks",
            json!({ "check_type": "recu", "check_number": "MAN-2", "amount": 700, "sale_id": sale }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let manual = id_of(&body);

    let (status, _) = app.delete(&format!("/api/projects/{project}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, checks) = app.get("/api/checks").await;
    assert_eq!(checks["data"]["total"], json!(1));
    assert_eq!(checks["data"]["items"][0]["id"], json!(manual));
    assert!(checks["data"]["items"][0]["project_id"].is_null());
}

#[tokio::test]
async fn pricing_edits_respect_collected_amounts() {
    let app = TestApp::new().await;
    let project = app.create_project("Modifications").await;
    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "project_id": project,
                "unit_number": "D1",
                "unit_type": "appartement",
                "client_name": "Omar",
                "total_price": 300000,
                "advance_declared": 50000,
                "advance_cheque": 50000,
                "advance_cheques": [{ "check_number": "AV-50", "amount": 50000 }],
                "installments": [
                    { "installment_number": 1, "due_date": "2099-03-01", "planned_amount": 200000 }
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = id_of(&body);
    let plan = body["data"]["schedule"]["entries"][1]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = app
        .post(
            &format!("/api/payments/plans/{plan}/payments"),
            json!({ "amount": 100000, "declared_amount": 100000, "cash_amount": 100000 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let uri = format!("/api/sales/{sale}");
    let (status, _) = app
        .put(&uri, json!({ "advance_declared": 400000, "advance_cheque": 400000 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.put(&uri, json!({ "total_price": 120000 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            &uri,
            json!({
                "advance_declared": 40000,
                "advance_undeclared": 10000,
                "advance_cash": 20000,
                "advance_cheque": 20000,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(
            &uri,
            json!({
                "advance_declared": 30000,
                "advance_undeclared": 30000,
                "advance_cash": 10000,
                "advance_cheque": 50000,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(dec(&body["data"]["advance_total"]), Decimal::from(60_000));
    assert_eq!(dec(&body["data"]["total_paid"]), Decimal::from(160_000));
    assert_eq!(dec(&body["data"]["total_price"]), Decimal::from(300_000));

    let (_, checks) = app.get(&format!("/api/checks?sale_id={sale}")).await;
    assert_eq!(checks["data"]["total"], json!(1));
    let cheque = &checks["data"]["items"][0];
    assert_eq!(cheque["source"], json!("avance_vente"));
    assert_eq!(dec(&cheque["amount"]), Decimal::from(50_000));
}
