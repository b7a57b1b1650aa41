//! End-to-end HTTP tests over the in-memory engine.

mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, decimal, spawn_app};
use kosh_shared::Role;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use uuid::Uuid;

const BASE: &str = "/api/tds-tcs";

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

async fn seed_rate_and_vendor(app: &TestApp, admin: &str) {
    let (status, _) = app
        .post(
            &url("/tds-rates"),
            admin,
            json!({
                "section": "194C",
                "rate": "1",
                "thresholdLimit": "30000",
                "validFrom": "2024-04-01",
                "panRequired": true
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            &url("/vendors"),
            admin,
            json!({
                "vendorId": "V001",
                "name": "Acme Contractors",
                "panNumber": "ABCPE1234F",
                "category": "individual"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn record(app: &TestApp, token: &str, amount: &str) -> (StatusCode, Value) {
    app.post(
        &url("/transactions"),
        token,
        json!({
            "vendorId": "V001",
            "transactionType": "contractor_payment",
            "amount": amount,
            "transactionDate": "2024-06-15"
        }),
    )
    .await
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "kosh-tds-tcs");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = spawn_app();
    let (status, body) = app.send(Method::GET, &url("/vendors"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let app = spawn_app();
    let (status, body) = app
        .send(Method::GET, &url("/vendors"), Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or malformed token");
}

#[tokio::test]
async fn test_viewer_cannot_create_rate() {
    let app = spawn_app();
    let viewer = app.token(Role::Viewer);
    let (status, body) = app
        .post(
            &url("/tds-rates"),
            &viewer,
            json!({"section": "194C", "rate": "1", "validFrom": "2024-04-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "insufficient permissions");
}

#[tokio::test]
async fn test_accountant_cannot_update_rate() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let (_, created) = app
        .post(
            &url("/tds-rates"),
            &admin,
            json!({"section": "194J", "rate": "10", "validFrom": "2024-04-01"}),
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap();

    let accountant = app.token(Role::Accountant);
    let (status, _) = app
        .put(&url(&format!("/tds-rates/{id}")), &accountant, json!({"rate": "2"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rate_create_and_duplicate() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let body = json!({
        "section": "194C",
        "natureOfPayment": "Contract work",
        "rate": "2",
        "surchargeRate": "10",
        "educationCessRate": "4",
        "validFrom": "2024-04-01",
        "validTo": "2025-03-31"
    });

    let (status, created) = app.post(&url("/tds-rates"), &admin, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["section"], "194C");
    assert_eq!(decimal(&created["data"]["effectiveRate"]), dec!(2.288));

    let (status, duplicate) = app.post(&url("/tds-rates"), &admin, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["success"], false);
    assert!(
        duplicate["message"]
            .as_str()
            .unwrap()
            .contains("already exists")
    );
}

#[tokio::test]
async fn test_tcs_section_on_tds_route_is_rejected() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let (status, body) = app
        .post(
            &url("/tds-rates"),
            &admin,
            json!({"section": "206C(1H)", "rate": "0.1", "validFrom": "2024-04-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_rate_list_with_sample_amount() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let auditor = app.token(Role::Auditor);
    let (status, body) = app
        .get(&url("/tds-rates?active=true&sampleAmount=100000"), &auditor)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rates = body["data"].as_array().unwrap();
    assert_eq!(rates.len(), 1);

    let (_, tcs) = app.get(&url("/tcs-rates"), &auditor).await;
    assert!(tcs["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_vendor_invalid_pan() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let (status, body) = app
        .post(
            &url("/vendors"),
            &admin,
            json!({"vendorId": "V009", "name": "Bad PAN Traders", "panNumber": "BAD123"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("invalid PAN format")
    );
}

#[tokio::test]
async fn test_vendor_field_validation_lists_fields() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let (status, body) = app
        .post(
            &url("/vendors"),
            &admin,
            json!({"vendorId": "V010", "name": "", "email": "not-an-email"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name"]);
}

#[tokio::test]
async fn test_vendor_is_company_scoped() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (status, _) = app.get(&url("/vendors/V001"), &admin).await;
    assert_eq!(status, StatusCode::OK);

    let outsider = app.token_for(Uuid::new_v4(), Role::Admin);
    let (status, body) = app.get(&url("/vendors/V001"), &outsider).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "VENDOR_NOT_FOUND");
}

#[tokio::test]
async fn test_vendor_soft_delete_keeps_profile() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (status, body) = app
        .send(Method::DELETE, &url("/vendors/V001"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "deactivated");

    let (_, listed) = app.get(&url("/vendors?active=false"), &admin).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_transaction_withheld_is_201() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let accountant = app.token(Role::Accountant);
    let (status, body) = record(&app, &accountant, "150000").await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(decimal(&data["taxAmount"]), dec!(1500));
    assert_eq!(data["outcome"], "withheld");
    assert_eq!(data["status"], "pending");
    assert_eq!(data["section"], "194C");
    assert_eq!(data["dueDate"], "2024-07-07");
}

#[tokio::test]
async fn test_transaction_below_threshold_is_200() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (status, body) = record(&app, &admin, "25000").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert_eq!(body["data"]["outcome"], "below_threshold");
    assert_eq!(decimal(&body["data"]["taxAmount"]), dec!(0));
}

#[tokio::test]
async fn test_transaction_unknown_vendor_is_404() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (status, _) = app
        .post(
            &url("/transactions"),
            &admin,
            json!({
                "vendorId": "V404",
                "transactionType": "contractor_payment",
                "amount": 50000,
                "transactionDate": "2024-06-15"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transaction_listing_pages_and_summarizes() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;
    for amount in ["150000", "200000", "25000"] {
        record(&app, &admin, amount).await;
    }

    let (status, body) = app
        .get(
            &url("/transactions?summaryBy=section&includeCalculations=false&page=1&limit=2"),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"]["transactions"];
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["meta"]["total"], 3);
    assert!(page["data"][0].get("calculationBreakdown").is_none());

    let summary = &body["data"]["summary"];
    assert_eq!(summary["totals"]["count"], 3);
    assert_eq!(decimal(&summary["totals"]["totalTax"]), dec!(3500));
    assert_eq!(summary["groups"][0]["key"], "194C");
    assert!(summary.get("kind").is_none());

    let (status, body) = app
        .get(&url("/transactions?summaryBy=section&kind=tds"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["kind"], "tds");
}

#[tokio::test]
async fn test_transaction_listing_rejects_bad_summary_key() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let (status, body) = app
        .get(&url("/transactions?summaryBy=weekday"), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("invalid summaryBy")
    );
}

#[tokio::test]
async fn test_transaction_bad_id_is_400() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let (status, _) = app.get(&url("/transactions/not-a-uuid"), &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_calculate_isolates_failures() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (status, body) = app
        .post(
            &url("/transactions/bulk-calculate"),
            &admin,
            json!({"items": [
                {"vendorId": "V001", "transactionType": "contractor_payment",
                 "amount": "100000", "transactionDate": "2024-06-15"},
                {"vendorId": "GHOST", "transactionType": "contractor_payment",
                 "amount": "100000", "transactionDate": "2024-06-15"}
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);
    assert_eq!(body["data"]["summary"]["failed"], 1);
    assert_eq!(decimal(&body["data"]["summary"]["totalTax"]), dec!(1000));
}

#[tokio::test]
async fn test_bulk_calculate_rejects_empty_batch() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    let (status, _) = app
        .post(&url("/transactions/bulk-calculate"), &admin, json!({"items": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_certificate_generation_and_duplicate() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (_, created) = record(&app, &admin, "150000").await;
    let id = created["data"]["id"].as_str().unwrap();
    let (status, _) = app
        .put(
            &url(&format!("/transactions/{id}")),
            &admin,
            json!({"status": "completed"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let request = json!({
        "vendorId": "V001",
        "certificateType": "tds",
        "periodStart": "2024-04-01",
        "periodEnd": "2024-06-30"
    });
    let (status, body) = app
        .post(&url("/certificates/generate"), &admin, request.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["certificateNumber"], "TDS/2024-25/Q1/V001");
    assert_eq!(decimal(&body["data"]["totalTds"]), dec!(1500));
    assert_eq!(body["data"]["transactionCount"], 1);

    let (status, body) = app
        .post(&url("/certificates/generate"), &admin, request)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_CERTIFICATE");
}

#[tokio::test]
async fn test_certificate_delivery() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (_, body) = app
        .post(
            &url("/certificates/generate"),
            &admin,
            json!({
                "vendorId": "V001",
                "certificateType": "tds",
                "periodStart": "2024-04-01",
                "periodEnd": "2024-06-30"
            }),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap();

    let (status, body) = app
        .put(
            &url(&format!("/certificates/{id}/status")),
            &admin,
            json!({"status": "delivered", "deliveredTo": "accounts@acme.test", "deliveryMethod": "email"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "delivered");
    assert_eq!(body["data"]["deliveryCount"], 1);
}

#[tokio::test]
async fn test_reports_and_alerts_are_readable_by_auditor() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;
    record(&app, &admin, "150000").await;

    let auditor = app.token(Role::Auditor);
    let (status, body) = app
        .get(&url("/reports/tds-summary?groupBy=vendor"), &auditor)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reportType"], "tds_summary");
    assert_eq!(body["data"]["groups"][0]["key"], "V001");

    let (status, body) = app
        .get(&url("/reports/compliance-status?asOf=2024-08-01"), &auditor)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["transactions"]["overdue"], 1);

    let (status, _) = app
        .post(&url("/alerts/generate"), &auditor, json!({"asOf": "2024-08-01"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            &url("/reports/quarterly-filing"),
            &auditor,
            json!({"quarter": "2024-25/Q1"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_quarterly_filing() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;
    record(&app, &admin, "150000").await;

    let (status, body) = app
        .post(
            &url("/reports/quarterly-filing"),
            &admin,
            json!({"quarter": "2024-25/Q1", "kind": "tds", "asOf": "2024-07-15"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["validation"]["isValid"].is_boolean());
}

#[tokio::test]
async fn test_invoice_workflow_reports_net_payable() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;

    let (status, body) = app
        .post(
            &url("/workflow/invoice-processing"),
            &admin,
            json!({
                "vendorId": "V001",
                "transactionType": "contractor_payment",
                "grossAmount": "100000",
                "invoiceDate": "2024-06-20",
                "invoiceNumber": "INV-42"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["taxAmount"]), dec!(1000));
    assert_eq!(decimal(&body["data"]["netPayable"]), dec!(99000));
}

#[tokio::test]
async fn test_rate_change_workflow_requires_admin() {
    let app = spawn_app();
    let admin = app.token(Role::Admin);
    seed_rate_and_vendor(&app, &admin).await;
    let change = json!({
        "kind": "tds",
        "section": "194C",
        "effectiveFrom": "2024-10-01",
        "rate": "2"
    });

    let accountant = app.token(Role::Accountant);
    let (status, _) = app
        .post(&url("/workflow/rate-change"), &accountant, change.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(&url("/workflow/rate-change"), &admin, change).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["previousRate"]["validTo"], "2024-09-30");
    assert_eq!(body["data"]["newRate"]["validFrom"], "2024-10-01");
}
