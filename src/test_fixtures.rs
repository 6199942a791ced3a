//! Shared builders for unit tests.

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::EventSender;
use crate::models::{InboundLineItem, InboundOrder, InboundOrderStatus, ProductRef};

/// Event sender whose receiver is drained in the background.
pub fn test_event_sender() -> EventSender {
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    EventSender::new(tx)
}

/// Order with one line item per `(expected, received, rejected, damaged)`
/// tuple. Products are not lot-tracked.
pub fn order_with_items(
    status: InboundOrderStatus,
    quantities: &[(i32, i32, i32, i32)],
) -> InboundOrder {
    let order_id = Uuid::new_v4();
    let line_items = quantities
        .iter()
        .enumerate()
        .map(|(idx, &(expected, received, rejected, damaged))| InboundLineItem {
            id: Uuid::new_v4(),
            order_id,
            product: ProductRef {
                id: Uuid::new_v4(),
                sku: format!("SKU-{:03}", idx + 1),
                name: format!("Product {}", idx + 1),
                lot_tracking_enabled: false,
            },
            qty_expected: expected,
            qty_received: received,
            qty_rejected: rejected,
            qty_damaged: damaged,
            rejection_reason: None,
            rejection_notes: None,
        })
        .collect();

    InboundOrder {
        id: order_id,
        reference_number: format!("PO-{}", &order_id.to_string()[..8]),
        supplier_name: "Acme Supply Co".to_string(),
        status,
        client_id: None,
        location_id: Uuid::new_v4(),
        expected_date: None,
        received_date: None,
        line_items,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
