use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use uuid::Uuid;

use super::{
    BackendError, LotNumberRequest, LotReceiptRequest, PalletReceiptRequest, WarehouseBackend,
};
use crate::models::{
    ChecklistItem, DamageReport, DamageReportFilter, InboundOrder, InboundOrderStatus, Location,
    NewDamageReport, NewPallet, Pallet, PalletContent, PutAwaySuggestion, ScanEvent,
    ScannedEntity, Sublocation, WorkflowRules,
};

/// In-memory stand-in for the warehouse data API.
///
/// Used by the test harness and the `in-memory` backend mode for local
/// development. Seed methods populate fixtures; `fail_call` injects a failure
/// into the nth call of a named operation so partial-failure paths can be
/// exercised deterministically.
#[derive(Default)]
pub struct InMemoryWarehouse {
    orders: DashMap<Uuid, InboundOrder>,
    rules: DashMap<Uuid, WorkflowRules>,
    pallets: DashMap<Uuid, Pallet>,
    locations: DashMap<Uuid, Location>,
    sublocations: DashMap<Uuid, Vec<Sublocation>>,
    barcodes: DashMap<String, ScannedEntity>,
    checklists: DashMap<Uuid, Vec<ChecklistItem>>,
    damage_reports: Mutex<Vec<DamageReport>>,
    inspection_holds: Mutex<Vec<(Uuid, Uuid, String)>>,
    lot_receipts: Mutex<Vec<LotReceiptRequest>>,
    putaway_confirmations: Mutex<Vec<(Uuid, Uuid, Uuid)>>,
    scan_events: Mutex<Vec<ScanEvent>>,
    call_counts: DashMap<String, usize>,
    fail_on: DashMap<String, Vec<usize>>,
    lpn_seq: AtomicU32,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_order(&self, order: InboundOrder) {
        self.orders.insert(order.id, order);
    }

    pub fn seed_rules(&self, order_id: Uuid, rules: WorkflowRules) {
        self.rules.insert(order_id, rules);
    }

    pub fn seed_location(&self, location: Location, sublocations: Vec<Sublocation>) {
        self.sublocations.insert(location.id, sublocations);
        self.locations.insert(location.id, location);
    }

    pub fn seed_pallet(&self, pallet: Pallet) {
        self.pallets.insert(pallet.id, pallet);
    }

    pub fn seed_barcode(&self, code: &str, entity: ScannedEntity) {
        self.barcodes.insert(code.to_string(), entity);
    }

    pub fn seed_checklist(&self, order_id: Uuid, items: Vec<ChecklistItem>) {
        self.checklists.insert(order_id, items);
    }

    /// Makes the `nth` call (1-based) of operation `op` fail.
    pub fn fail_call(&self, op: &str, nth: usize) {
        self.fail_on.entry(op.to_string()).or_default().push(nth);
    }

    pub fn lot_receipts(&self) -> Vec<LotReceiptRequest> {
        self.lot_receipts.lock().expect("lock").clone()
    }

    pub fn inspection_holds(&self) -> Vec<(Uuid, Uuid, String)> {
        self.inspection_holds.lock().expect("lock").clone()
    }

    pub fn putaway_confirmations(&self) -> Vec<(Uuid, Uuid, Uuid)> {
        self.putaway_confirmations.lock().expect("lock").clone()
    }

    pub fn scan_events(&self) -> Vec<ScanEvent> {
        self.scan_events.lock().expect("lock").clone()
    }

    pub fn checklist(&self, order_id: Uuid) -> Vec<ChecklistItem> {
        self.checklists
            .get(&order_id)
            .map(|items| items.clone())
            .unwrap_or_default()
    }

    fn gate(&self, op: &str) -> Result<(), BackendError> {
        let mut count = self.call_counts.entry(op.to_string()).or_insert(0);
        *count += 1;
        let nth = *count;
        drop(count);

        if let Some(failures) = self.fail_on.get(op) {
            if failures.contains(&nth) {
                return Err(BackendError::Rejected(format!(
                    "injected failure for {} (call {})",
                    op, nth
                )));
            }
        }
        Ok(())
    }

    fn with_item<T>(
        &self,
        item_id: Uuid,
        apply: impl FnOnce(&mut crate::models::InboundLineItem) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        for mut order in self.orders.iter_mut() {
            if let Some(item) = order.line_items.iter_mut().find(|li| li.id == item_id) {
                let result = apply(item)?;
                order.updated_at = Utc::now();
                return Ok(result);
            }
        }
        Err(BackendError::NotFound(format!(
            "inbound item {} not found",
            item_id
        )))
    }
}

#[async_trait]
impl WarehouseBackend for InMemoryWarehouse {
    async fn get_inbound_order(&self, id: Uuid) -> Result<InboundOrder, BackendError> {
        self.gate("get_inbound_order")?;
        self.orders
            .get(&id)
            .map(|o| o.clone())
            .ok_or_else(|| BackendError::NotFound(format!("inbound order {} not found", id)))
    }

    async fn update_inbound_order_status(
        &self,
        id: Uuid,
        status: InboundOrderStatus,
    ) -> Result<InboundOrder, BackendError> {
        self.gate("update_inbound_order_status")?;
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| BackendError::NotFound(format!("inbound order {} not found", id)))?;
        order.status = status;
        order.updated_at = Utc::now();
        if status == InboundOrderStatus::Received {
            order.received_date = Some(Utc::now().date_naive());
        }
        Ok(order.clone())
    }

    async fn receive_inbound_item(
        &self,
        item_id: Uuid,
        new_total_qty: i32,
        _location_id: Uuid,
    ) -> Result<(), BackendError> {
        self.gate("receive_inbound_item")?;
        self.with_item(item_id, |item| {
            if new_total_qty < item.qty_received {
                return Err(BackendError::Rejected(format!(
                    "received total may not decrease ({} -> {})",
                    item.qty_received, new_total_qty
                )));
            }
            item.qty_received = new_total_qty;
            Ok(())
        })
    }

    async fn receive_with_lot(&self, receipt: &LotReceiptRequest) -> Result<(), BackendError> {
        self.gate("receive_with_lot")?;
        self.with_item(receipt.item_id, |item| {
            if receipt.new_total_qty < item.qty_received {
                return Err(BackendError::Rejected(format!(
                    "received total may not decrease ({} -> {})",
                    item.qty_received, receipt.new_total_qty
                )));
            }
            item.qty_received = receipt.new_total_qty;
            Ok(())
        })?;
        self.lot_receipts.lock().expect("lock").push(receipt.clone());
        Ok(())
    }

    async fn receive_inbound_item_to_pallet(
        &self,
        receipt: &PalletReceiptRequest,
    ) -> Result<(), BackendError> {
        self.gate("receive_inbound_item_to_pallet")?;
        let product_id = self.with_item(receipt.item_id, |item| {
            item.qty_received += receipt.qty_received;
            Ok(item.product.id)
        })?;

        let mut pallet = self.pallets.get_mut(&receipt.pallet_id).ok_or_else(|| {
            BackendError::NotFound(format!("pallet {} not found", receipt.pallet_id))
        })?;
        pallet.location_id = Some(receipt.location_id);
        match pallet
            .contents
            .iter_mut()
            .find(|c| c.product_id == product_id)
        {
            Some(content) => content.quantity += receipt.qty_received,
            None => pallet.contents.push(PalletContent {
                product_id,
                quantity: receipt.qty_received,
            }),
        }
        Ok(())
    }

    async fn reject_inbound_item(
        &self,
        item_id: Uuid,
        qty: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<(), BackendError> {
        self.gate("reject_inbound_item")?;
        self.with_item(item_id, |item| {
            item.qty_rejected += qty;
            item.rejection_reason = Some(reason.to_string());
            item.rejection_notes = notes.map(str::to_string);
            Ok(())
        })
    }

    async fn create_pallet_for_receiving(
        &self,
        pallet: &NewPallet,
    ) -> Result<Pallet, BackendError> {
        self.gate("create_pallet_for_receiving")?;
        let lpn = pallet.lpn.clone().unwrap_or_else(|| {
            format!("LPN-{:06}", self.lpn_seq.fetch_add(1, Ordering::SeqCst) + 1)
        });
        let created = Pallet {
            id: Uuid::new_v4(),
            lpn,
            container_type: pallet.container_type.clone(),
            location_id: Some(pallet.location_id),
            contents: Vec::new(),
        };
        self.pallets.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_pallet_lpns(&self) -> Result<Vec<Pallet>, BackendError> {
        self.gate("get_pallet_lpns")?;
        Ok(self.pallets.iter().map(|p| p.clone()).collect())
    }

    async fn get_inbound_workflow_rules_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<WorkflowRules, BackendError> {
        self.gate("get_inbound_workflow_rules_for_order")?;
        Ok(self
            .rules
            .get(&order_id)
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    async fn generate_lot_number(
        &self,
        request: &LotNumberRequest,
    ) -> Result<String, BackendError> {
        self.gate("generate_lot_number")?;
        let date = Utc::now().format("%Y%m%d").to_string();
        let rand_part = format!("{:04}", rand::thread_rng().gen_range(0..10_000));
        Ok(request
            .format
            .replace("{sku}", &request.sku)
            .replace("{supplier}", &request.supplier)
            .replace("{date}", &date)
            .replace("{rand}", &rand_part))
    }

    async fn place_on_inspection_hold(
        &self,
        item_id: Uuid,
        order_id: Uuid,
        reason: &str,
    ) -> Result<(), BackendError> {
        self.gate("place_on_inspection_hold")?;
        self.inspection_holds
            .lock()
            .expect("lock")
            .push((order_id, item_id, reason.to_string()));
        Ok(())
    }

    async fn get_suggested_put_away(
        &self,
        _product_id: Uuid,
        location_id: Uuid,
        _qty: i32,
    ) -> Result<PutAwaySuggestion, BackendError> {
        self.gate("get_suggested_put_away")?;
        let sublocations = self
            .sublocations
            .get(&location_id)
            .map(|s| s.clone())
            .unwrap_or_default();
        let mut sorted: Vec<Sublocation> = sublocations;
        sorted.sort_by(|a, b| a.code.cmp(&b.code));
        let first = sorted.into_iter().next().ok_or_else(|| {
            BackendError::Rejected(format!("no sublocations configured for {}", location_id))
        })?;
        Ok(PutAwaySuggestion {
            sublocation_id: first.id,
            reason: format!("first open bin {}", first.code),
            sublocation_code: first.code,
        })
    }

    async fn confirm_put_away(
        &self,
        product_id: Uuid,
        location_id: Uuid,
        sublocation_id: Uuid,
    ) -> Result<(), BackendError> {
        self.gate("confirm_put_away")?;
        let belongs = self
            .sublocations
            .get(&location_id)
            .map(|subs| subs.iter().any(|s| s.id == sublocation_id))
            .unwrap_or(false);
        if !belongs {
            return Err(BackendError::Rejected(format!(
                "sublocation {} is not part of location {}",
                sublocation_id, location_id
            )));
        }
        self.putaway_confirmations
            .lock()
            .expect("lock")
            .push((product_id, location_id, sublocation_id));
        Ok(())
    }

    async fn get_sublocations(&self, location_id: Uuid) -> Result<Vec<Sublocation>, BackendError> {
        self.gate("get_sublocations")?;
        Ok(self
            .sublocations
            .get(&location_id)
            .map(|s| s.clone())
            .unwrap_or_default())
    }

    async fn get_locations(&self) -> Result<Vec<Location>, BackendError> {
        self.gate("get_locations")?;
        Ok(self.locations.iter().map(|l| l.clone()).collect())
    }

    async fn log_scan_event(&self, event: &ScanEvent) -> Result<(), BackendError> {
        self.gate("log_scan_event")?;
        self.scan_events.lock().expect("lock").push(event.clone());
        Ok(())
    }

    async fn resolve_barcode(&self, code: &str) -> Result<Option<ScannedEntity>, BackendError> {
        self.gate("resolve_barcode")?;
        Ok(self.barcodes.get(code).map(|e| e.clone()))
    }

    async fn get_damage_reports(
        &self,
        filter: &DamageReportFilter,
    ) -> Result<Vec<DamageReport>, BackendError> {
        self.gate("get_damage_reports")?;
        Ok(self
            .damage_reports
            .lock()
            .expect("lock")
            .iter()
            .filter(|r| filter.order_id.map_or(true, |id| r.order_id == id))
            .filter(|r| filter.product_id.map_or(true, |id| r.product_id == id))
            .cloned()
            .collect())
    }

    async fn create_damage_report(
        &self,
        report: &NewDamageReport,
    ) -> Result<DamageReport, BackendError> {
        self.gate("create_damage_report")?;
        let created = DamageReport {
            id: Uuid::new_v4(),
            order_id: report.order_id,
            product_id: report.product_id,
            quantity: report.quantity,
            severity: report.severity,
            description: report.description.clone(),
            estimated_value: report.estimated_value,
            reported_at: Utc::now(),
        };

        // Damaged quantity on the line item is derived from damage reports.
        if let Some(mut order) = self.orders.get_mut(&report.order_id) {
            if let Some(item) = order
                .line_items
                .iter_mut()
                .find(|li| li.product.id == report.product_id)
            {
                item.qty_damaged += report.quantity;
            }
            order.updated_at = Utc::now();
        }

        self.damage_reports
            .lock()
            .expect("lock")
            .push(created.clone());
        Ok(created)
    }

    async fn get_arrival_checklist(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<ChecklistItem>, BackendError> {
        self.gate("get_arrival_checklist")?;
        if !self.orders.contains_key(&order_id) {
            return Err(BackendError::NotFound(format!(
                "inbound order {} not found",
                order_id
            )));
        }
        Ok(self.checklist(order_id))
    }

    async fn set_checklist_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        done: bool,
    ) -> Result<(), BackendError> {
        self.gate("set_checklist_item")?;
        let mut items = self.checklists.get_mut(&order_id).ok_or_else(|| {
            BackendError::NotFound(format!("checklist for order {} not found", order_id))
        })?;
        let item = items.iter_mut().find(|i| i.id == item_id).ok_or_else(|| {
            BackendError::NotFound(format!("checklist item {} not found", item_id))
        })?;
        item.done = done;
        Ok(())
    }
}
