use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use receiving_gateway::{
    client::InMemoryWarehouse,
    config::AppConfig,
    events::{self, EventSender},
    models::{
        ChecklistItem, InboundLineItem, InboundOrder, InboundOrderStatus, Location, Pallet,
        ProductRef, Sublocation,
    },
    AppState,
};

/// Test harness: full router over an in-memory warehouse backend.
pub struct TestApp {
    router: Router,
    pub warehouse: Arc<InMemoryWarehouse>,
    #[allow(dead_code)]
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub fn new() -> Self {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(
            AppConfig::new("in-memory", "127.0.0.1", 18080, "test"),
            warehouse.clone(),
            EventSender::new(event_tx),
        );
        let router = receiving_gateway::app_router().with_state(state.clone());

        Self {
            router,
            warehouse,
            state,
            _event_task: event_task,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router call");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::POST, path, None).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, None).await
    }
}

/// Order with one line item per `(expected, received, rejected, damaged)`
/// tuple; `lot_tracked` applies to every product.
#[allow(dead_code)]
pub fn build_order(
    status: InboundOrderStatus,
    quantities: &[(i32, i32, i32, i32)],
    lot_tracked: bool,
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
                lot_tracking_enabled: lot_tracked,
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
        client_id: Some(Uuid::new_v4()),
        location_id: Uuid::new_v4(),
        expected_date: None,
        received_date: None,
        line_items,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[allow(dead_code)]
pub fn seed_location(warehouse: &InMemoryWarehouse, location_id: Uuid, bins: &[&str]) -> Vec<Sublocation> {
    let sublocations: Vec<Sublocation> = bins
        .iter()
        .map(|code| Sublocation {
            id: Uuid::new_v4(),
            location_id,
            code: (*code).to_string(),
        })
        .collect();
    warehouse.seed_location(
        Location {
            id: location_id,
            code: "RCV".to_string(),
            name: "Receiving dock".to_string(),
        },
        sublocations.clone(),
    );
    sublocations
}

#[allow(dead_code)]
pub fn seed_pallet(warehouse: &InMemoryWarehouse, container_type: &str) -> Pallet {
    let pallet = Pallet {
        id: Uuid::new_v4(),
        lpn: format!("LPN-{}", &Uuid::new_v4().to_string()[..8]),
        container_type: container_type.to_string(),
        location_id: None,
        contents: Vec::new(),
    };
    warehouse.seed_pallet(pallet.clone());
    pallet
}

#[allow(dead_code)]
pub fn seed_checklist(warehouse: &InMemoryWarehouse, order_id: Uuid, labels: &[&str]) -> Vec<ChecklistItem> {
    let items: Vec<ChecklistItem> = labels
        .iter()
        .map(|label| ChecklistItem {
            id: Uuid::new_v4(),
            label: (*label).to_string(),
            done: false,
        })
        .collect();
    warehouse.seed_checklist(order_id, items.clone());
    items
}
