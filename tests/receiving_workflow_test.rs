//! Receive-modal workflow: plain, lot, and pallet branches, validation
//! ordering, cumulative totals, and the automatic status transition.

mod common;

use axum::http::StatusCode;
use common::{build_order, seed_pallet, TestApp};
use receiving_gateway::models::{InboundOrderStatus, WorkflowRules};
use serde_json::{json, Value};
use uuid::Uuid;

async fn open_session(app: &TestApp, order_id: Uuid, item_id: Uuid) -> Value {
    let (code, body) = app
        .post(
            "/api/v1/receiving/sessions",
            json!({ "order_id": order_id, "item_id": item_id }),
        )
        .await;
    assert_eq!(code, StatusCode::CREATED, "open session failed: {}", body);
    body
}

fn session_path(session: &Value, suffix: &str) -> String {
    format!(
        "/api/v1/receiving/sessions/{}{}",
        session["id"].as_str().unwrap(),
        suffix
    )
}

#[tokio::test]
async fn receiving_requires_an_arrived_order() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::InTransit, &[(10, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let (code, body) = app
        .post(
            "/api/v1/receiving/sessions",
            json!({ "order_id": order_id, "item_id": item_id }),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("arrived"));
}

#[tokio::test]
async fn plain_receive_submits_an_absolute_total() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(20, 4, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    assert_eq!(session["mode"], "plain");
    assert_eq!(session["lot_tracked"], false);

    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 6 }))
        .await;
    let (code, outcome) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(outcome["completed"], true);
    assert_eq!(outcome["applied_qty"], 6);
    assert_eq!(outcome["report"]["steps"][0]["cumulative_total"], 10);
    assert_eq!(outcome["order"]["line_items"][0]["qty_received"], 10);

    // Session is discarded after a completed submit.
    let (code, _) = app.get(&session_path(&session, "")).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_quantity_is_rejected_before_any_call() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(20, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    let (code, body) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("greater than zero"));

    let (_, detail) = app
        .get(&format!("/api/v1/inbound-orders/{}", order_id))
        .await;
    assert_eq!(detail["order"]["line_items"][0]["qty_received"], 0);
}

#[tokio::test]
async fn lot_receive_carries_strictly_increasing_cumulative_totals() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(50, 10, 0, 0)], true);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    assert_eq!(session["mode"], "lot");
    assert_eq!(session["lot_tracked"], true);
    // Lot-tracked sessions open with one empty entry row.
    assert_eq!(session["lot_entries"].as_array().unwrap().len(), 1);

    app.put(
        &session_path(&session, "/lots/0"),
        json!({ "lot_number": "L1", "quantity": 5 }),
    )
    .await;
    app.post_empty(&session_path(&session, "/lots")).await;
    app.put(
        &session_path(&session, "/lots/1"),
        json!({ "lot_number": "L2", "quantity": 3 }),
    )
    .await;

    let (code, outcome) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK, "submit failed: {}", outcome);
    assert_eq!(outcome["completed"], true);
    assert_eq!(outcome["applied_qty"], 8);

    let receipts = app.warehouse.lot_receipts();
    assert_eq!(receipts.len(), 2);
    assert_eq!(receipts[0].lot_number, "L1");
    assert_eq!(receipts[0].new_total_qty, 15);
    assert_eq!(receipts[1].lot_number, "L2");
    assert_eq!(receipts[1].new_total_qty, 18);

    assert_eq!(outcome["order"]["line_items"][0]["qty_received"], 18);
}

#[tokio::test]
async fn missing_lot_number_blocks_the_whole_submission() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(50, 0, 0, 0)], true);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    app.put(
        &session_path(&session, "/lots/0"),
        json!({ "lot_number": "L1", "quantity": 5 }),
    )
    .await;
    app.post_empty(&session_path(&session, "/lots")).await;
    app.put(
        &session_path(&session, "/lots/1"),
        json!({ "lot_number": "", "quantity": 3 }),
    )
    .await;

    let (code, body) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("lot number required"));

    // No call was issued, not even for the valid first entry.
    assert!(app.warehouse.lot_receipts().is_empty());
}

#[tokio::test]
async fn expiration_dates_are_required_when_rules_demand_them() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(50, 0, 0, 0)], true);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);
    app.warehouse.seed_rules(
        order_id,
        WorkflowRules {
            enabled: true,
            requires_expiration_dates: true,
            ..WorkflowRules::default()
        },
    );

    let session = open_session(&app, order_id, item_id).await;
    app.put(
        &session_path(&session, "/lots/0"),
        json!({ "lot_number": "L1", "quantity": 5 }),
    )
    .await;

    let (code, body) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("expiration date"));

    // Providing the date unblocks it.
    app.put(
        &session_path(&session, "/lots/0"),
        json!({ "lot_number": "L1", "quantity": 5, "expiration_date": "2027-03-01" }),
    )
    .await;
    let (code, _) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK);

    let receipts = app.warehouse.lot_receipts();
    assert_eq!(receipts.len(), 1);
    assert!(receipts[0].expiration_date.is_some());
}

#[tokio::test]
async fn client_rules_force_lot_capture_for_untracked_products() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(50, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);
    app.warehouse.seed_rules(
        order_id,
        WorkflowRules {
            enabled: true,
            requires_lot_tracking: true,
            ..WorkflowRules::default()
        },
    );

    let session = open_session(&app, order_id, item_id).await;
    assert_eq!(session["lot_tracked"], true);
    assert_eq!(session["mode"], "lot");
}

#[tokio::test]
async fn auto_created_lot_numbers_follow_the_client_format() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(50, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);
    app.warehouse.seed_rules(
        order_id,
        WorkflowRules {
            enabled: true,
            auto_create_lots: true,
            lot_number_format: Some("LOT-{sku}-{date}".to_string()),
            ..WorkflowRules::default()
        },
    );

    let session = open_session(&app, order_id, item_id).await;
    assert_eq!(session["lot_tracked"], true);
    let seeded = session["lot_entries"][0]["lot_number"].as_str().unwrap();
    assert!(seeded.starts_with("LOT-SKU-001-"), "got '{}'", seeded);
}

#[tokio::test]
async fn mid_loop_failure_leaves_earlier_lots_applied() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(50, 0, 0, 0)], true);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);
    app.warehouse.fail_call("receive_with_lot", 2);

    let session = open_session(&app, order_id, item_id).await;
    for (idx, (lot, qty)) in [("L1", 5), ("L2", 3), ("L3", 2)].iter().enumerate() {
        if idx > 0 {
            app.post_empty(&session_path(&session, "/lots")).await;
        }
        app.put(
            &session_path(&session, &format!("/lots/{}", idx)),
            json!({ "lot_number": lot, "quantity": qty }),
        )
        .await;
    }

    let (code, outcome) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(outcome["completed"], false);
    assert_eq!(outcome["applied_qty"], 5);

    let steps = outcome["report"]["steps"].as_array().unwrap();
    assert_eq!(steps[0]["status"], "applied");
    assert_eq!(steps[1]["status"], "failed");
    assert_eq!(steps[2]["status"], "skipped");

    // Only the first lot landed; no rollback of it.
    assert_eq!(outcome["order"]["line_items"][0]["qty_received"], 5);
    assert_eq!(app.warehouse.lot_receipts().len(), 1);

    // Session survives a partial failure for retry.
    let (code, _) = app.get(&session_path(&session, "")).await;
    assert_eq!(code, StatusCode::OK);
}

#[tokio::test]
async fn pallet_mode_requires_a_pallet_selection() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(20, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    app.put(
        &session_path(&session, "/pallet-mode"),
        json!({ "enabled": true }),
    )
    .await;
    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 5 }))
        .await;

    let (code, body) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("select or create a pallet"));
}

#[tokio::test]
async fn pallet_receive_bypasses_lot_capture_and_flags_it() {
    let app = TestApp::new();
    // Lot-tracked product, received in pallet mode anyway.
    let order = build_order(InboundOrderStatus::Arrived, &[(20, 0, 0, 0)], true);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);
    let pallet = seed_pallet(&app.warehouse, "pallet");

    let session = open_session(&app, order_id, item_id).await;
    app.post(
        &session_path(&session, "/pallet"),
        json!({ "pallet_id": pallet.id }),
    )
    .await;
    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 7 }))
        .await;

    let (code, outcome) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(outcome["mode"], "pallet");
    assert_eq!(outcome["lot_capture_skipped"], true);
    assert_eq!(outcome["order"]["line_items"][0]["qty_received"], 7);
    assert!(app.warehouse.lot_receipts().is_empty());
}

#[tokio::test]
async fn pallet_container_type_must_be_allowed_by_rules() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(20, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);
    app.warehouse.seed_rules(
        order_id,
        WorkflowRules {
            allowed_container_types: vec!["pallet".to_string()],
            ..WorkflowRules::default()
        },
    );

    let session = open_session(&app, order_id, item_id).await;
    let (code, body) = app
        .post(
            &session_path(&session, "/pallet/new"),
            json!({ "container_type": "gaylord" }),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("not allowed"));

    let (code, pallet) = app
        .post(
            &session_path(&session, "/pallet/new"),
            json!({ "container_type": "pallet" }),
        )
        .await;
    assert_eq!(code, StatusCode::CREATED);
    assert!(pallet["lpn"].as_str().unwrap().starts_with("LPN-"));
}

#[tokio::test]
async fn inspection_hold_is_placed_after_any_receive_path() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(20, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);
    app.warehouse.seed_rules(
        order_id,
        WorkflowRules {
            enabled: true,
            requires_inspection: true,
            ..WorkflowRules::default()
        },
    );

    let session = open_session(&app, order_id, item_id).await;
    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 5 }))
        .await;
    let (code, outcome) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(outcome["inspection_hold_placed"], true);

    let holds = app.warehouse.inspection_holds();
    assert_eq!(holds.len(), 1);
    assert_eq!(holds[0].0, order_id);
    assert_eq!(holds[0].1, item_id);
}

#[tokio::test]
async fn full_receipt_auto_completes_the_order() {
    let app = TestApp::new();
    let order = build_order(
        InboundOrderStatus::Arrived,
        &[(10, 10, 0, 0), (5, 0, 0, 0)],
        false,
    );
    let (order_id, item_id) = (order.id, order.line_items[1].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 5 }))
        .await;

    let (code, outcome) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(outcome["auto_completed"], true);
    assert_eq!(outcome["order"]["status"], "received");
}

#[tokio::test]
async fn partial_receipt_does_not_auto_complete() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 4 }))
        .await;

    let (_, outcome) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(outcome["auto_completed"], false);
    assert_eq!(outcome["order"]["status"], "arrived");
}

#[tokio::test]
async fn over_receipt_is_a_hard_validation_error() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 4, 2, 1)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    // 4 received + 2 rejected + 1 damaged leaves room for 3.
    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 4 }))
        .await;

    let (code, body) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("cannot receive"));

    app.put(&session_path(&session, "/quantity"), json!({ "quantity": 3 }))
        .await;
    let (code, _) = app.post_empty(&session_path(&session, "/submit")).await;
    assert_eq!(code, StatusCode::OK);
}

#[tokio::test]
async fn rejection_accumulates_and_respects_the_expected_ceiling() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 5, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let (code, body) = app
        .post(
            &format!(
                "/api/v1/inbound-orders/{}/items/{}/reject",
                order_id, item_id
            ),
            json!({ "qty": 3, "reason": "crushed cartons", "notes": "whole top layer" }),
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["order"]["line_items"][0]["qty_rejected"], 3);
    assert_eq!(body["progress"][0]["remaining"], 2);

    // Only 2 units remain unaccounted.
    let (code, _) = app
        .post(
            &format!(
                "/api/v1/inbound-orders/{}/items/{}/reject",
                order_id, item_id
            ),
            json!({ "qty": 3, "reason": "crushed cartons" }),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn closing_a_session_discards_it() {
    let app = TestApp::new();
    let order = build_order(InboundOrderStatus::Arrived, &[(10, 0, 0, 0)], false);
    let (order_id, item_id) = (order.id, order.line_items[0].id);
    app.warehouse.seed_order(order);

    let session = open_session(&app, order_id, item_id).await;
    let (code, _) = app.delete(&session_path(&session, "")).await;
    assert_eq!(code, StatusCode::NO_CONTENT);

    let (code, _) = app.get(&session_path(&session, "")).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}
