use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Inbound order status enumeration
///
/// Statuses are ordered and move strictly forward:
/// `ordered -> in_transit -> arrived -> received`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InboundOrderStatus {
    Ordered,
    InTransit,
    Arrived,
    Received,
}

impl InboundOrderStatus {
    /// The next status in the forward-only sequence, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            InboundOrderStatus::Ordered => Some(InboundOrderStatus::InTransit),
            InboundOrderStatus::InTransit => Some(InboundOrderStatus::Arrived),
            InboundOrderStatus::Arrived => Some(InboundOrderStatus::Received),
            InboundOrderStatus::Received => None,
        }
    }

    /// Whether `to` is a legal transition from this status. Only single
    /// forward steps are legal; there is no skipping and no going back.
    pub fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(self) -> bool {
        self == InboundOrderStatus::Received
    }
}

impl fmt::Display for InboundOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundOrderStatus::Ordered => write!(f, "ordered"),
            InboundOrderStatus::InTransit => write!(f, "in_transit"),
            InboundOrderStatus::Arrived => write!(f, "arrived"),
            InboundOrderStatus::Received => write!(f, "received"),
        }
    }
}

/// Product fields the receiving workflow needs; the catalog itself lives
/// behind the warehouse data API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductRef {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub lot_tracking_enabled: bool,
}

/// A single expected line on an inbound order.
///
/// `qty_received` is monotonically non-decreasing; `qty_rejected` accumulates.
/// `qty_damaged` is derived server-side from damage reports keyed by
/// product and order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InboundLineItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product: ProductRef,
    pub qty_expected: i32,
    pub qty_received: i32,
    #[serde(default)]
    pub qty_rejected: i32,
    #[serde(default)]
    pub qty_damaged: i32,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub rejection_notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InboundOrder {
    pub id: Uuid,
    pub reference_number: String,
    pub supplier_name: String,
    pub status: InboundOrderStatus,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    /// Receiving location goods on this order land at.
    pub location_id: Uuid,
    #[serde(default)]
    pub expected_date: Option<NaiveDate>,
    #[serde(default)]
    pub received_date: Option<NaiveDate>,
    pub line_items: Vec<InboundLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InboundOrder {
    pub fn line_item(&self, item_id: Uuid) -> Option<&InboundLineItem> {
        self.line_items.iter().find(|li| li.id == item_id)
    }

    /// True when every line item has received at least its expected quantity.
    pub fn fully_received(&self) -> bool {
        self.line_items
            .iter()
            .all(|li| li.qty_received >= li.qty_expected)
    }
}
