//! Arrival checklist toggles (the one optimistic-update path) and damage
//! report CRUD.

mod common;

use axum::http::StatusCode;
use common::{build_order, seed_checklist, TestApp};
use receiving_gateway::models::InboundOrderStatus;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn checklist_toggle_round_trips() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 0, 0, 0)], false);
    let order_id = order.id;
    app.warehouse.seed_order(order);
    let items = seed_checklist(&app.warehouse, order_id, &["Seal intact", "Paperwork present"]);

    let (code, body) = app
        .get(&format!("/api/v1/inbound-orders/{}/checklist", order_id))
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (code, body) = app
        .put(
            &format!(
                "/api/v1/inbound-orders/{}/checklist/{}",
                order_id, items[0].id
            ),
            json!({ "done": true }),
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body[0]["done"], true);
    assert_eq!(body[1]["done"], false);
    assert!(app.warehouse.checklist(order_id)[0].done);
}

#[tokio::test]
async fn failed_toggle_rolls_back_and_backend_stays_clean() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 0, 0, 0)], false);
    let order_id = order.id;
    app.warehouse.seed_order(order);
    let items = seed_checklist(&app.warehouse, order_id, &["Seal intact"]);
    app.warehouse.fail_call("set_checklist_item", 1);

    let (code, _) = app
        .put(
            &format!(
                "/api/v1/inbound-orders/{}/checklist/{}",
                order_id, items[0].id
            ),
            json!({ "done": true }),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    // Local snapshot restored, backend untouched.
    assert!(!app.warehouse.checklist(order_id)[0].done);
    let (_, body) = app
        .get(&format!("/api/v1/inbound-orders/{}/checklist", order_id))
        .await;
    assert_eq!(body[0]["done"], false);
}

#[tokio::test]
async fn damage_report_feeds_the_reconciliation_view() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 2, 0, 0)], false);
    let order_id = order.id;
    let product_id = order.line_items[0].product.id;
    app.warehouse.seed_order(order);

    let (code, report) = app
        .post(
            "/api/v1/damage-reports",
            json!({
                "order_id": order_id,
                "product_id": product_id,
                "quantity": 3,
                "severity": "major",
                "description": "forklift puncture",
                "estimated_value": dec!(140.50),
            }),
        )
        .await;
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(report["quantity"], 3);

    // Damaged quantity shows up in the derived line-item view.
    let (_, detail) = app
        .get(&format!("/api/v1/inbound-orders/{}", order_id))
        .await;
    assert_eq!(detail["order"]["line_items"][0]["qty_damaged"], 3);
    assert_eq!(detail["progress"][0]["remaining"], 5);

    // Filters narrow by order and product.
    let (_, listed) = app
        .get(&format!("/api/v1/damage-reports?order_id={}", order_id))
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, listed) = app
        .get(&format!("/api/v1/damage-reports?product_id={}", Uuid::new_v4()))
        .await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn damage_report_validation_blocks_bad_input() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 0, 0, 0)], false);
    let order_id = order.id;
    let product_id = order.line_items[0].product.id;
    app.warehouse.seed_order(order);

    let (code, _) = app
        .post(
            "/api/v1/damage-reports",
            json!({
                "order_id": order_id,
                "product_id": product_id,
                "quantity": 0,
                "severity": "minor",
                "description": "dented",
            }),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (code, _) = app
        .post(
            "/api/v1/damage-reports",
            json!({
                "order_id": order_id,
                "product_id": product_id,
                "quantity": 1,
                "severity": "minor",
                "description": "",
            }),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (_, listed) = app.get("/api/v1/damage-reports").await;
    assert!(listed.as_array().unwrap().is_empty());
}
