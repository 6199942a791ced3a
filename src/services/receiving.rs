use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    client::{LotNumberRequest, LotReceiptRequest, PalletReceiptRequest, WarehouseBackend},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{InboundLineItem, InboundOrder, InboundOrderStatus, NewPallet, Pallet, WorkflowRules},
    services::{
        order_status::OrderStatusService,
        reconciliation::LineItemProgress,
        support::{BatchReport, StepStatus},
    },
};

/// One lot being captured in the current receiving action. Ephemeral: lives
/// only inside an open receive session and is submitted as its own
/// receive-with-lot call.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct LotEntry {
    #[serde(default)]
    pub lot_number: String,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub quantity: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveMode {
    Plain,
    Lot,
    Pallet,
}

#[derive(Clone)]
struct ReceiveSession {
    id: Uuid,
    order_id: Uuid,
    item_id: Uuid,
    location_id: Uuid,
    supplier_name: String,
    item: InboundLineItem,
    rules: WorkflowRules,
    lot_tracked: bool,
    pallet_mode: bool,
    selected_pallet_id: Option<Uuid>,
    lot_entries: Vec<LotEntry>,
    quantity: i32,
    opened_at: DateTime<Utc>,
}

impl ReceiveSession {
    fn mode(&self) -> ReceiveMode {
        if self.pallet_mode {
            ReceiveMode::Pallet
        } else if self.lot_tracked {
            ReceiveMode::Lot
        } else {
            ReceiveMode::Plain
        }
    }

    fn active_entries(&self) -> impl Iterator<Item = &LotEntry> {
        self.lot_entries.iter().filter(|e| e.quantity > 0)
    }

    fn view(&self) -> ReceiveSessionView {
        ReceiveSessionView {
            id: self.id,
            order_id: self.order_id,
            item_id: self.item_id,
            mode: self.mode(),
            lot_tracked: self.lot_tracked,
            pallet_mode: self.pallet_mode,
            selected_pallet_id: self.selected_pallet_id,
            lot_entries: self.lot_entries.clone(),
            quantity: self.quantity,
            rules: self.rules.clone(),
            progress: LineItemProgress::for_item(&self.item),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReceiveSessionView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub mode: ReceiveMode,
    pub lot_tracked: bool,
    pub pallet_mode: bool,
    pub selected_pallet_id: Option<Uuid>,
    pub lot_entries: Vec<LotEntry>,
    pub quantity: i32,
    pub rules: WorkflowRules,
    pub progress: LineItemProgress,
}

/// Everything a submission did, including per-step outcomes for the
/// sequential lot loop. `completed` is false when a mid-loop failure left
/// some lots applied and the rest skipped.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ReceiveOutcome {
    pub mode: ReceiveMode,
    pub report: BatchReport,
    pub applied_qty: i32,
    pub completed: bool,
    /// True when a lot-tracked item was received in pallet mode, which
    /// bypasses lot capture; the pallet carries lot identity downstream.
    pub lot_capture_skipped: bool,
    pub inspection_hold_placed: bool,
    /// True when the automatic `arrived -> received` transition fired.
    pub auto_completed: bool,
    pub order: InboundOrder,
}

/// Receive-modal workflow: one ephemeral session per open modal, discarded
/// on close/cancel with no persistence.
pub struct ReceivingService {
    backend: Arc<dyn WarehouseBackend>,
    event_sender: EventSender,
    order_status: Arc<OrderStatusService>,
    sessions: DashMap<Uuid, ReceiveSession>,
}

impl ReceivingService {
    pub fn new(
        backend: Arc<dyn WarehouseBackend>,
        event_sender: EventSender,
        order_status: Arc<OrderStatusService>,
    ) -> Self {
        Self {
            backend,
            event_sender,
            order_status,
            sessions: DashMap::new(),
        }
    }

    /// Opens a receive session for one line item. Loads workflow rules and
    /// decides up front whether lot capture applies.
    #[instrument(skip(self), fields(order_id = %order_id, item_id = %item_id))]
    pub async fn open_session(
        &self,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<ReceiveSessionView, ServiceError> {
        let order = self.backend.get_inbound_order(order_id).await?;

        if order.status != InboundOrderStatus::Arrived {
            return Err(ServiceError::InvalidOperation(format!(
                "order must be arrived before receiving, status is '{}'",
                order.status
            )));
        }

        let item = order
            .line_item(item_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "line item {} not found on order {}",
                    item_id, order_id
                ))
            })?
            .clone();

        let rules = self
            .backend
            .get_inbound_workflow_rules_for_order(order_id)
            .await?;
        rules
            .validate_loaded()
            .map_err(ServiceError::ValidationError)?;

        let lot_tracked = item.product.lot_tracking_enabled || rules.forces_lot_capture();

        let mut session = ReceiveSession {
            id: Uuid::new_v4(),
            order_id,
            item_id,
            location_id: order.location_id,
            supplier_name: order.supplier_name.clone(),
            item,
            rules,
            lot_tracked,
            pallet_mode: false,
            selected_pallet_id: None,
            lot_entries: Vec::new(),
            quantity: 0,
            opened_at: Utc::now(),
        };

        if lot_tracked {
            let lot_number = self.auto_lot_number(&session).await?;
            session.lot_entries.push(LotEntry {
                lot_number,
                ..LotEntry::default()
            });
        }

        let view = session.view();
        self.sessions.insert(session.id, session);
        info!("Receive session {} opened", view.id);
        Ok(view)
    }

    pub fn get_session(&self, session_id: Uuid) -> Result<ReceiveSessionView, ServiceError> {
        self.sessions
            .get(&session_id)
            .map(|s| s.view())
            .ok_or_else(|| session_not_found(session_id))
    }

    /// Appends a lot entry row, pre-filling a generated lot number when the
    /// client auto-creates lots.
    pub async fn add_lot_entry(
        &self,
        session_id: Uuid,
    ) -> Result<ReceiveSessionView, ServiceError> {
        let snapshot = self
            .sessions
            .get(&session_id)
            .map(|s| s.clone())
            .ok_or_else(|| session_not_found(session_id))?;

        if !snapshot.lot_tracked {
            return Err(ServiceError::InvalidOperation(
                "this item is not lot tracked".to_string(),
            ));
        }

        let lot_number = self.auto_lot_number(&snapshot).await?;

        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.lot_entries.push(LotEntry {
            lot_number,
            ..LotEntry::default()
        });
        Ok(session.view())
    }

    /// Replaces one lot entry row with the posted values.
    pub fn update_lot_entry(
        &self,
        session_id: Uuid,
        index: usize,
        entry: LotEntry,
    ) -> Result<ReceiveSessionView, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;

        let slot = session.lot_entries.get_mut(index).ok_or_else(|| {
            ServiceError::NotFound(format!("lot entry {} does not exist", index))
        })?;
        *slot = entry;
        Ok(session.view())
    }

    pub fn set_quantity(
        &self,
        session_id: Uuid,
        quantity: i32,
    ) -> Result<ReceiveSessionView, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.quantity = quantity;
        Ok(session.view())
    }

    pub fn set_pallet_mode(
        &self,
        session_id: Uuid,
        enabled: bool,
    ) -> Result<ReceiveSessionView, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.pallet_mode = enabled;
        if !enabled {
            session.selected_pallet_id = None;
        }
        Ok(session.view())
    }

    pub async fn list_pallets(&self) -> Result<Vec<Pallet>, ServiceError> {
        Ok(self.backend.get_pallet_lpns().await?)
    }

    /// Selects an existing pallet for pallet-mode receiving.
    pub async fn select_pallet(
        &self,
        session_id: Uuid,
        pallet_id: Uuid,
    ) -> Result<ReceiveSessionView, ServiceError> {
        let pallets = self.backend.get_pallet_lpns().await?;
        if !pallets.iter().any(|p| p.id == pallet_id) {
            return Err(ServiceError::NotFound(format!(
                "pallet {} not found",
                pallet_id
            )));
        }

        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.pallet_mode = true;
        session.selected_pallet_id = Some(pallet_id);
        Ok(session.view())
    }

    /// Creates a pallet at receive time and selects it. Container type must
    /// be allowed by the client's workflow rules.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn create_pallet(
        &self,
        session_id: Uuid,
        container_type: String,
        lpn: Option<String>,
    ) -> Result<Pallet, ServiceError> {
        let (location_id, rules) = {
            let session = self
                .sessions
                .get(&session_id)
                .ok_or_else(|| session_not_found(session_id))?;
            (session.location_id, session.rules.clone())
        };

        if !rules.container_type_allowed(&container_type) {
            return Err(ServiceError::ValidationError(format!(
                "container type '{}' is not allowed for this client",
                container_type
            )));
        }

        let created = self
            .backend
            .create_pallet_for_receiving(&NewPallet {
                lpn,
                container_type,
                location_id,
            })
            .await?;

        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.pallet_mode = true;
        session.selected_pallet_id = Some(created.id);
        info!("Pallet {} created for session {}", created.lpn, session_id);
        Ok(created)
    }

    /// Submits the receiving action for this session.
    ///
    /// Lot mode issues one sequential call per lot entry with quantity > 0,
    /// each carrying the absolute running total; a mid-loop failure leaves
    /// earlier lots applied and the rest skipped. On success the order is
    /// refetched and the automatic status-transition check runs.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn submit(&self, session_id: Uuid) -> Result<ReceiveOutcome, ServiceError> {
        let session = self
            .sessions
            .get(&session_id)
            .map(|s| s.clone())
            .ok_or_else(|| session_not_found(session_id))?;

        let mode = validate_for_submit(&session)?;
        let mut report = BatchReport::default();
        let mut applied_qty = 0i32;

        match mode {
            ReceiveMode::Plain => {
                let new_total = session.item.qty_received + session.quantity;
                self.backend
                    .receive_inbound_item(session.item_id, new_total, session.location_id)
                    .await?;
                report.record_with_total("quantity", session.quantity, new_total, StepStatus::Applied);
                applied_qty = session.quantity;

                self.event_sender
                    .send_or_log(Event::ItemReceived {
                        order_id: session.order_id,
                        item_id: session.item_id,
                        quantity: session.quantity,
                        new_total,
                    })
                    .await;
            }
            ReceiveMode::Pallet => {
                let pallet_id = session.selected_pallet_id.ok_or_else(|| {
                    ServiceError::InternalError("pallet mode without pallet".to_string())
                })?;
                self.backend
                    .receive_inbound_item_to_pallet(&PalletReceiptRequest {
                        item_id: session.item_id,
                        qty_received: session.quantity,
                        location_id: session.location_id,
                        pallet_id,
                    })
                    .await?;
                report.record("pallet", session.quantity, StepStatus::Applied);
                applied_qty = session.quantity;

                self.event_sender
                    .send_or_log(Event::PalletReceived {
                        order_id: session.order_id,
                        item_id: session.item_id,
                        pallet_id,
                        quantity: session.quantity,
                    })
                    .await;
            }
            ReceiveMode::Lot => {
                // Each call carries the absolute total so the backend never
                // sees a delta; entries apply in list order.
                let mut running_total = session.item.qty_received;
                let mut failed = false;

                for entry in session.active_entries() {
                    if failed {
                        report.record(entry.lot_number.clone(), entry.quantity, StepStatus::Skipped);
                        continue;
                    }

                    running_total += entry.quantity;
                    let receipt = LotReceiptRequest {
                        item_id: session.item_id,
                        new_total_qty: running_total,
                        location_id: session.location_id,
                        lot_number: entry.lot_number.clone(),
                        expiration_date: entry.expiration_date,
                        batch_number: entry.batch_number.clone(),
                    };

                    match self.backend.receive_with_lot(&receipt).await {
                        Ok(()) => {
                            report.record_with_total(
                                entry.lot_number.clone(),
                                entry.quantity,
                                running_total,
                                StepStatus::Applied,
                            );
                            applied_qty += entry.quantity;

                            self.event_sender
                                .send_or_log(Event::LotReceived {
                                    order_id: session.order_id,
                                    item_id: session.item_id,
                                    lot_number: entry.lot_number.clone(),
                                    quantity: entry.quantity,
                                    new_total: running_total,
                                })
                                .await;
                        }
                        Err(err) => {
                            error!(
                                "Lot receive failed for '{}': {}",
                                entry.lot_number, err
                            );
                            report.record_with_total(
                                entry.lot_number.clone(),
                                entry.quantity,
                                running_total,
                                StepStatus::Failed {
                                    message: err.to_string(),
                                },
                            );
                            failed = true;
                        }
                    }
                }
            }
        }

        let completed = report.completed();

        // Inspection hold applies after whichever receive path ran, as long
        // as anything was actually applied.
        let mut inspection_hold_placed = false;
        if applied_qty > 0 && session.rules.requires_inspection_hold() {
            match self
                .backend
                .place_on_inspection_hold(
                    session.item_id,
                    session.order_id,
                    "receiving inspection required",
                )
                .await
            {
                Ok(()) => {
                    inspection_hold_placed = true;
                    self.event_sender
                        .send_or_log(Event::InspectionHoldPlaced {
                            order_id: session.order_id,
                            item_id: session.item_id,
                        })
                        .await;
                }
                Err(err) => error!("Failed to place inspection hold: {}", err),
            }
        }

        // The backend owns the truth; refetch rather than merging locally.
        let mut order = self.backend.get_inbound_order(session.order_id).await?;

        let mut auto_completed = false;
        match self.order_status.auto_complete_if_fully_received(&order).await {
            Ok(Some(updated)) => {
                order = updated;
                auto_completed = true;
            }
            Ok(None) => {}
            Err(err) => warn!("Auto-complete check failed: {}", err),
        }

        if completed {
            self.sessions.remove(&session_id);
        } else if let Some(mut stored) = self.sessions.get_mut(&session_id) {
            // Keep the session alive so the operator can retry the
            // remaining lots against a fresh item snapshot.
            if let Some(item) = order.line_item(session.item_id) {
                stored.item = item.clone();
            }
        }

        Ok(ReceiveOutcome {
            mode,
            report,
            applied_qty,
            completed,
            lot_capture_skipped: mode == ReceiveMode::Pallet && session.lot_tracked,
            inspection_hold_placed,
            auto_completed,
            order,
        })
    }

    /// Records rejected quantity against a line item.
    #[instrument(skip(self, notes), fields(order_id = %order_id, item_id = %item_id))]
    pub async fn reject_item(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        qty: i32,
        reason: &str,
        notes: Option<&str>,
    ) -> Result<InboundOrder, ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::ValidationError(
                "rejected quantity must be greater than zero".to_string(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "rejection reason required".to_string(),
            ));
        }

        let order = self.backend.get_inbound_order(order_id).await?;
        let item = order.line_item(item_id).ok_or_else(|| {
            ServiceError::NotFound(format!(
                "line item {} not found on order {}",
                item_id, order_id
            ))
        })?;

        let accounted = item.qty_received + item.qty_rejected + item.qty_damaged;
        if accounted + qty > item.qty_expected {
            return Err(ServiceError::ValidationError(format!(
                "cannot reject {} units: only {} unaccounted on this line",
                qty,
                item.qty_expected - accounted
            )));
        }

        self.backend
            .reject_inbound_item(item_id, qty, reason, notes)
            .await?;

        self.event_sender
            .send_or_log(Event::ItemRejected {
                order_id,
                item_id,
                quantity: qty,
                reason: reason.to_string(),
            })
            .await;

        Ok(self.backend.get_inbound_order(order_id).await?)
    }

    /// Discards a session. Closing twice is a no-op.
    pub fn close_session(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }

    /// Drops sessions older than `ttl`. Returns how many were discarded.
    pub fn purge_stale(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.opened_at > cutoff);
        before - self.sessions.len()
    }

    async fn auto_lot_number(&self, session: &ReceiveSession) -> Result<String, ServiceError> {
        if !session.rules.auto_creates_lots() {
            return Ok(String::new());
        }
        let format = match session.rules.lot_number_format.clone() {
            Some(format) => format,
            None => return Ok(String::new()),
        };
        Ok(self
            .backend
            .generate_lot_number(&LotNumberRequest {
                format,
                sku: session.item.product.sku.clone(),
                supplier: session.supplier_name.clone(),
            })
            .await?)
    }
}

fn session_not_found(session_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("receive session {} not found", session_id))
}

/// Pre-submission validation. Runs entirely before any network call; a
/// failure here mutates nothing.
fn validate_for_submit(session: &ReceiveSession) -> Result<ReceiveMode, ServiceError> {
    let mode = session.mode();

    let total_delta: i32 = match mode {
        ReceiveMode::Lot => session.active_entries().map(|e| e.quantity).sum(),
        _ => session.quantity,
    };

    if total_delta <= 0 {
        return Err(ServiceError::ValidationError(match mode {
            ReceiveMode::Lot => "total lot quantity must be greater than zero".to_string(),
            _ => "quantity must be greater than zero".to_string(),
        }));
    }

    if mode == ReceiveMode::Lot {
        if session.rules.requires_expirations()
            && session.active_entries().any(|e| e.expiration_date.is_none())
        {
            return Err(ServiceError::ValidationError(
                "expiration date required for every lot".to_string(),
            ));
        }

        if session
            .active_entries()
            .any(|e| e.lot_number.trim().is_empty())
        {
            return Err(ServiceError::ValidationError(
                "lot number required".to_string(),
            ));
        }
    }

    if mode == ReceiveMode::Pallet && session.selected_pallet_id.is_none() {
        return Err(ServiceError::ValidationError(
            "select or create a pallet".to_string(),
        ));
    }

    let item = &session.item;
    let accounted = item.qty_received + item.qty_rejected + item.qty_damaged;
    if accounted + total_delta > item.qty_expected {
        return Err(ServiceError::ValidationError(format!(
            "cannot receive {} units: only {} remaining on this line",
            total_delta,
            (item.qty_expected - accounted).max(0)
        )));
    }

    Ok(mode)
}
