use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{ScanOutcome, ScanWorkflow};

/// Events emitted by the receiving workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    /// The automatic `arrived -> received` completion fired.
    OrderAutoCompleted {
        order_id: Uuid,
    },
    ItemReceived {
        order_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        new_total: i32,
    },
    LotReceived {
        order_id: Uuid,
        item_id: Uuid,
        lot_number: String,
        quantity: i32,
        new_total: i32,
    },
    PalletReceived {
        order_id: Uuid,
        item_id: Uuid,
        pallet_id: Uuid,
        quantity: i32,
    },
    ItemRejected {
        order_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        reason: String,
    },
    InspectionHoldPlaced {
        order_id: Uuid,
        item_id: Uuid,
    },
    PutAwayConfirmed {
        product_id: Uuid,
        location_id: Uuid,
        sublocation_id: Uuid,
    },
    ScanCommitted {
        workflow: ScanWorkflow,
        outcome: ScanOutcome,
    },
    DamageReported {
        report_id: Uuid,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Workflow outcomes never depend on event delivery.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event dropped: {}", e);
        }
    }
}

/// Background consumer for workflow events.
///
/// Events currently feed the structured log stream; downstream integrations
/// attach here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "inbound order status changed");
            }
            Event::OrderAutoCompleted { order_id } => {
                info!(%order_id, "inbound order auto-completed after full receipt");
            }
            Event::ItemReceived {
                order_id,
                item_id,
                quantity,
                new_total,
            } => {
                info!(%order_id, %item_id, quantity, new_total, "item received");
            }
            Event::LotReceived {
                order_id,
                item_id,
                lot_number,
                quantity,
                new_total,
            } => {
                info!(%order_id, %item_id, %lot_number, quantity, new_total, "lot received");
            }
            Event::PalletReceived {
                order_id,
                item_id,
                pallet_id,
                quantity,
            } => {
                info!(%order_id, %item_id, %pallet_id, quantity, "received to pallet");
            }
            Event::ItemRejected {
                order_id,
                item_id,
                quantity,
                reason,
            } => {
                info!(%order_id, %item_id, quantity, %reason, "item rejected");
            }
            Event::InspectionHoldPlaced { order_id, item_id } => {
                info!(%order_id, %item_id, "inspection hold placed");
            }
            Event::PutAwayConfirmed {
                product_id,
                location_id,
                sublocation_id,
            } => {
                info!(%product_id, %location_id, %sublocation_id, "put-away confirmed");
            }
            Event::ScanCommitted { workflow, outcome } => {
                info!(?workflow, ?outcome, "scan action committed");
            }
            Event::DamageReported {
                report_id,
                order_id,
                product_id,
                quantity,
            } => {
                info!(%report_id, %order_id, %product_id, quantity, "damage reported");
            }
        }
    }

    info!("Event processing loop stopped");
}
