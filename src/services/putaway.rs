use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    client::WarehouseBackend,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{ProductRef, PutAwaySuggestion, Sublocation},
    services::support::{BatchReport, StepStatus},
};

/// One received line item on the put-away board.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PutAwayLine {
    pub item_id: Uuid,
    pub product: ProductRef,
    pub quantity: i32,
    /// System suggestion; absent when the suggestion call failed and the
    /// operator has to pick a bin manually.
    pub suggestion: Option<PutAwaySuggestion>,
    pub selected_sublocation_id: Option<Uuid>,
    pub confirmed: bool,
}

#[derive(Clone)]
struct PutAwayBoard {
    id: Uuid,
    order_id: Uuid,
    location_id: Uuid,
    lines: Vec<PutAwayLine>,
    opened_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PutAwayBoardView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub location_id: Uuid,
    pub lines: Vec<PutAwayLine>,
    /// Bins the operator may pick instead of the suggestion.
    pub sublocations: Vec<Sublocation>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ConfirmAllOutcome {
    pub report: BatchReport,
    pub confirmed_count: usize,
    pub completed: bool,
}

/// Put-away assignment flow that follows receiving: suggestion per received
/// line, operator override, irreversible per-line confirm, and a sequential
/// confirm-all.
pub struct PutAwayService {
    backend: Arc<dyn WarehouseBackend>,
    event_sender: EventSender,
    boards: DashMap<Uuid, PutAwayBoard>,
}

impl PutAwayService {
    pub fn new(backend: Arc<dyn WarehouseBackend>, event_sender: EventSender) -> Self {
        Self {
            backend,
            event_sender,
            boards: DashMap::new(),
        }
    }

    /// Builds a board from the order's received lines, fetching a suggestion
    /// for each one sequentially.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn open_board(&self, order_id: Uuid) -> Result<PutAwayBoardView, ServiceError> {
        let order = self.backend.get_inbound_order(order_id).await?;

        let mut lines = Vec::new();
        for item in order.line_items.iter().filter(|li| li.qty_received > 0) {
            let suggestion = match self
                .backend
                .get_suggested_put_away(item.product.id, order.location_id, item.qty_received)
                .await
            {
                Ok(suggestion) => Some(suggestion),
                Err(err) => {
                    warn!(
                        "No put-away suggestion for {}: {}",
                        item.product.sku, err
                    );
                    None
                }
            };

            lines.push(PutAwayLine {
                item_id: item.id,
                product: item.product.clone(),
                quantity: item.qty_received,
                selected_sublocation_id: suggestion.as_ref().map(|s| s.sublocation_id),
                suggestion,
                confirmed: false,
            });
        }

        let board = PutAwayBoard {
            id: Uuid::new_v4(),
            order_id,
            location_id: order.location_id,
            lines,
            opened_at: Utc::now(),
        };

        let view = self.view(&board).await?;
        self.boards.insert(board.id, board);
        info!("Put-away board {} opened", view.id);
        Ok(view)
    }

    pub async fn get_board(&self, board_id: Uuid) -> Result<PutAwayBoardView, ServiceError> {
        let board = self
            .boards
            .get(&board_id)
            .map(|b| b.clone())
            .ok_or_else(|| board_not_found(board_id))?;
        self.view(&board).await
    }

    /// Overrides the suggested bin with any sublocation of the receiving
    /// location. Confirmed lines cannot be retargeted.
    #[instrument(skip(self), fields(board_id = %board_id, item_id = %item_id))]
    pub async fn select_sublocation(
        &self,
        board_id: Uuid,
        item_id: Uuid,
        sublocation_id: Uuid,
    ) -> Result<PutAwayBoardView, ServiceError> {
        let location_id = self
            .boards
            .get(&board_id)
            .map(|b| b.location_id)
            .ok_or_else(|| board_not_found(board_id))?;

        let sublocations = self.backend.get_sublocations(location_id).await?;
        if !sublocations.iter().any(|s| s.id == sublocation_id) {
            return Err(ServiceError::ValidationError(format!(
                "sublocation {} is not part of location {}",
                sublocation_id, location_id
            )));
        }

        let board = {
            let mut board = self
                .boards
                .get_mut(&board_id)
                .ok_or_else(|| board_not_found(board_id))?;
            let line = board
                .lines
                .iter_mut()
                .find(|l| l.item_id == item_id)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("item {} not on this board", item_id))
                })?;
            if line.confirmed {
                return Err(ServiceError::InvalidOperation(
                    "line is already confirmed".to_string(),
                ));
            }
            line.selected_sublocation_id = Some(sublocation_id);
            board.clone()
        };

        self.view(&board).await
    }

    /// Confirms one line. Irreversible for the session.
    #[instrument(skip(self), fields(board_id = %board_id, item_id = %item_id))]
    pub async fn confirm_line(
        &self,
        board_id: Uuid,
        item_id: Uuid,
    ) -> Result<PutAwayBoardView, ServiceError> {
        let (location_id, product_id, sublocation_id) = {
            let board = self
                .boards
                .get(&board_id)
                .ok_or_else(|| board_not_found(board_id))?;
            let line = board
                .lines
                .iter()
                .find(|l| l.item_id == item_id)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("item {} not on this board", item_id))
                })?;
            if line.confirmed {
                return Err(ServiceError::InvalidOperation(
                    "line is already confirmed".to_string(),
                ));
            }
            let sublocation_id = line.selected_sublocation_id.ok_or_else(|| {
                ServiceError::ValidationError("select a sublocation first".to_string())
            })?;
            (board.location_id, line.product.id, sublocation_id)
        };

        self.backend
            .confirm_put_away(product_id, location_id, sublocation_id)
            .await?;

        self.event_sender
            .send_or_log(Event::PutAwayConfirmed {
                product_id,
                location_id,
                sublocation_id,
            })
            .await;

        let board = {
            let mut board = self
                .boards
                .get_mut(&board_id)
                .ok_or_else(|| board_not_found(board_id))?;
            if let Some(line) = board.lines.iter_mut().find(|l| l.item_id == item_id) {
                line.confirmed = true;
            }
            board.clone()
        };

        self.view(&board).await
    }

    /// Confirms every unconfirmed line with a selected sublocation, one at a
    /// time in board order. A mid-batch failure stops the batch; earlier
    /// confirmations stand and remaining lines are reported as skipped.
    #[instrument(skip(self), fields(board_id = %board_id))]
    pub async fn confirm_all(&self, board_id: Uuid) -> Result<ConfirmAllOutcome, ServiceError> {
        let (location_id, targets) = {
            let board = self
                .boards
                .get(&board_id)
                .ok_or_else(|| board_not_found(board_id))?;
            let targets: Vec<(Uuid, Uuid, Uuid, String, i32)> = board
                .lines
                .iter()
                .filter(|l| !l.confirmed)
                .filter_map(|l| {
                    l.selected_sublocation_id.map(|sublocation_id| {
                        (
                            l.item_id,
                            l.product.id,
                            sublocation_id,
                            l.product.sku.clone(),
                            l.quantity,
                        )
                    })
                })
                .collect();
            (board.location_id, targets)
        };

        let mut report = BatchReport::default();
        let mut confirmed_count = 0usize;
        let mut failed = false;

        for (item_id, product_id, sublocation_id, sku, quantity) in targets {
            if failed {
                report.record(sku, quantity, StepStatus::Skipped);
                continue;
            }

            match self
                .backend
                .confirm_put_away(product_id, location_id, sublocation_id)
                .await
            {
                Ok(()) => {
                    report.record(sku, quantity, StepStatus::Applied);
                    confirmed_count += 1;

                    if let Some(mut board) = self.boards.get_mut(&board_id) {
                        if let Some(line) =
                            board.lines.iter_mut().find(|l| l.item_id == item_id)
                        {
                            line.confirmed = true;
                        }
                    }

                    self.event_sender
                        .send_or_log(Event::PutAwayConfirmed {
                            product_id,
                            location_id,
                            sublocation_id,
                        })
                        .await;
                }
                Err(err) => {
                    warn!("Confirm-all stopped at {}: {}", sku, err);
                    report.record(
                        sku,
                        quantity,
                        StepStatus::Failed {
                            message: err.to_string(),
                        },
                    );
                    failed = true;
                }
            }
        }

        let completed = report.completed();
        Ok(ConfirmAllOutcome {
            report,
            confirmed_count,
            completed,
        })
    }

    /// Discards a board. Closing twice is a no-op.
    pub fn close_board(&self, board_id: Uuid) {
        self.boards.remove(&board_id);
    }

    /// Drops boards older than `ttl`. Returns how many were discarded.
    pub fn purge_stale(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        let before = self.boards.len();
        self.boards.retain(|_, b| b.opened_at > cutoff);
        before - self.boards.len()
    }

    async fn view(&self, board: &PutAwayBoard) -> Result<PutAwayBoardView, ServiceError> {
        let sublocations = self.backend.get_sublocations(board.location_id).await?;
        Ok(PutAwayBoardView {
            id: board.id,
            order_id: board.order_id,
            location_id: board.location_id,
            lines: board.lines.clone(),
            sublocations,
        })
    }
}

fn board_not_found(board_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("put-away board {} not found", board_id))
}
