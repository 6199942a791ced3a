use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    ChecklistItem, DamageReport, DamageReportFilter, InboundOrder, InboundOrderStatus, Location,
    NewDamageReport, NewPallet, Pallet, PutAwaySuggestion, ScanEvent, ScannedEntity, Sublocation,
    WorkflowRules,
};

pub mod http;
pub mod memory;

pub use http::HttpWarehouseBackend;
pub use memory::InMemoryWarehouse;

/// Errors raised by the warehouse data API boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("warehouse API unreachable: {0}")]
    Transport(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Rejected(String),

    #[error("invalid warehouse API payload: {0}")]
    Decode(String),
}

/// One receive-with-lot call. `new_total_qty` is the absolute received total
/// after this call, never a delta.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LotReceiptRequest {
    pub item_id: Uuid,
    pub new_total_qty: i32,
    pub location_id: Uuid,
    pub lot_number: String,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub batch_number: Option<String>,
}

/// One receive-to-pallet call. Unlike the other receive operations this
/// carries the received quantity itself, not an absolute total.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PalletReceiptRequest {
    pub item_id: Uuid,
    pub qty_received: i32,
    pub location_id: Uuid,
    pub pallet_id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LotNumberRequest {
    pub format: String,
    pub sku: String,
    pub supplier: String,
}

/// The warehouse data API this service orchestrates against.
///
/// The backend owns persistence and business rules; this service never
/// assumes a lock and re-derives correctness by refetching after every
/// mutating call. Implementations surface failures as typed errors carrying
/// a message and perform no retries.
#[async_trait]
pub trait WarehouseBackend: Send + Sync {
    async fn get_inbound_order(&self, id: Uuid) -> Result<InboundOrder, BackendError>;

    async fn update_inbound_order_status(
        &self,
        id: Uuid,
        status: InboundOrderStatus,
    ) -> Result<InboundOrder, BackendError>;

    /// Records an absolute received total for a line item.
    async fn receive_inbound_item(
        &self,
        item_id: Uuid,
        new_total_qty: i32,
        location_id: Uuid,
    ) -> Result<(), BackendError>;

    async fn receive_with_lot(&self, receipt: &LotReceiptRequest) -> Result<(), BackendError>;

    async fn receive_inbound_item_to_pallet(
        &self,
        receipt: &PalletReceiptRequest,
    ) -> Result<(), BackendError>;

    async fn reject_inbound_item(
        &self,
        item_id: Uuid,
        qty: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<(), BackendError>;

    async fn create_pallet_for_receiving(
        &self,
        pallet: &NewPallet,
    ) -> Result<Pallet, BackendError>;

    async fn get_pallet_lpns(&self) -> Result<Vec<Pallet>, BackendError>;

    async fn get_inbound_workflow_rules_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<WorkflowRules, BackendError>;

    async fn generate_lot_number(
        &self,
        request: &LotNumberRequest,
    ) -> Result<String, BackendError>;

    async fn place_on_inspection_hold(
        &self,
        item_id: Uuid,
        order_id: Uuid,
        reason: &str,
    ) -> Result<(), BackendError>;

    async fn get_suggested_put_away(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        qty: i32,
    ) -> Result<PutAwaySuggestion, BackendError>;

    async fn confirm_put_away(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        sublocation_id: Uuid,
    ) -> Result<(), BackendError>;

    async fn get_sublocations(&self, location_id: Uuid) -> Result<Vec<Sublocation>, BackendError>;

    async fn get_locations(&self) -> Result<Vec<Location>, BackendError>;

    async fn log_scan_event(&self, event: &ScanEvent) -> Result<(), BackendError>;

    /// Resolves a scanned code to a typed entity; `None` when nothing matches.
    async fn resolve_barcode(&self, code: &str) -> Result<Option<ScannedEntity>, BackendError>;

    async fn get_damage_reports(
        &self,
        filter: &DamageReportFilter,
    ) -> Result<Vec<DamageReport>, BackendError>;

    async fn create_damage_report(
        &self,
        report: &NewDamageReport,
    ) -> Result<DamageReport, BackendError>;

    async fn get_arrival_checklist(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<ChecklistItem>, BackendError>;

    async fn set_checklist_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        done: bool,
    ) -> Result<(), BackendError>;
}
