use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{InboundLineItem, InboundOrder};

/// Status badge shown next to a line item, highest precedence first:
/// CompleteWithRejections > Complete > Partial > Pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemBadge {
    CompleteWithRejections,
    Complete,
    Partial,
    Pending,
}

/// Per-line receiving progress, derived entirely from current order state.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct LineItemProgress {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub qty_expected: i32,
    pub qty_received: i32,
    pub qty_rejected: i32,
    pub qty_damaged: i32,
    pub remaining: i32,
    pub is_complete: bool,
    pub is_partial: bool,
    pub is_pending: bool,
    pub badge: ItemBadge,
}

impl LineItemProgress {
    pub fn for_item(item: &InboundLineItem) -> Self {
        let outstanding =
            item.qty_expected - item.qty_received - item.qty_rejected - item.qty_damaged;
        let remaining = outstanding.max(0);
        let is_complete = outstanding <= 0;
        let is_partial = item.qty_received > 0 && outstanding > 0;
        let is_pending =
            item.qty_received == 0 && item.qty_rejected == 0 && item.qty_damaged == 0;

        let badge = if is_complete && item.qty_rejected > 0 {
            ItemBadge::CompleteWithRejections
        } else if is_complete {
            ItemBadge::Complete
        } else if is_partial {
            ItemBadge::Partial
        } else {
            ItemBadge::Pending
        };

        Self {
            item_id: item.id,
            product_id: item.product.id,
            sku: item.product.sku.clone(),
            qty_expected: item.qty_expected,
            qty_received: item.qty_received,
            qty_rejected: item.qty_rejected,
            qty_damaged: item.qty_damaged,
            remaining,
            is_complete,
            is_partial,
            is_pending,
            badge,
        }
    }
}

/// Order-level rollup for the detail view header.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReceivingSummary {
    pub total_lines: usize,
    pub complete_lines: usize,
    pub fully_received: bool,
}

pub fn order_progress(order: &InboundOrder) -> Vec<LineItemProgress> {
    order.line_items.iter().map(LineItemProgress::for_item).collect()
}

pub fn receiving_summary(order: &InboundOrder) -> ReceivingSummary {
    let lines = order_progress(order);
    ReceivingSummary {
        total_lines: lines.len(),
        complete_lines: lines.iter().filter(|l| l.is_complete).count(),
        fully_received: order.fully_received(),
    }
}
