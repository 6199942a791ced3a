use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    client::WarehouseBackend,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        InboundOrderStatus, ScanEvent, ScanOutcome, ScanStage, ScanTone, ScanWorkflow,
        ScannedEntity,
    },
    services::order_status::OrderStatusService,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    AwaitingPrimary,
    AwaitingComplement,
    ReadyToConfirm,
}

#[derive(Clone)]
struct ScanSession {
    id: Uuid,
    workflow: ScanWorkflow,
    /// Order context for the ship scanner's confirm action.
    order_id: Option<Uuid>,
    audio_enabled: bool,
    primary: Option<ScannedEntity>,
    primary_code: Option<String>,
    complement: Option<ScannedEntity>,
    complement_code: Option<String>,
    opened_at: DateTime<Utc>,
}

impl ScanSession {
    fn phase(&self) -> ScanPhase {
        match (&self.primary, &self.complement) {
            (None, _) => ScanPhase::AwaitingPrimary,
            (Some(_), None) => {
                if self.workflow == ScanWorkflow::Product {
                    // Lookup-only scanner never advances to a second phase.
                    ScanPhase::AwaitingPrimary
                } else {
                    ScanPhase::AwaitingComplement
                }
            }
            (Some(_), Some(_)) => ScanPhase::ReadyToConfirm,
        }
    }

    fn view(&self) -> ScanSessionView {
        ScanSessionView {
            id: self.id,
            workflow: self.workflow,
            order_id: self.order_id,
            phase: self.phase(),
            audio_enabled: self.audio_enabled,
            primary: self.primary.clone(),
            complement: self.complement.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ScanSessionView {
    pub id: Uuid,
    pub workflow: ScanWorkflow,
    pub order_id: Option<Uuid>,
    pub phase: ScanPhase,
    pub audio_enabled: bool,
    pub primary: Option<ScannedEntity>,
    pub complement: Option<ScannedEntity>,
}

/// Response to a single scan: what it resolved to, what it did to the
/// session, and the advisory tone for the handheld speaker.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ScanFeedback {
    pub outcome: ScanOutcome,
    /// Absent when the session has audio feedback turned off.
    pub tone: Option<ScanTone>,
    pub phase: ScanPhase,
    pub entity: Option<ScannedEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Barcode-driven workflows: two-phase scan state machines for ship and
/// put-away, plus a lookup-only product scanner. Every scan is logged as an
/// audit event regardless of what it led to.
pub struct ScannerService {
    backend: Arc<dyn WarehouseBackend>,
    event_sender: EventSender,
    order_status: Arc<OrderStatusService>,
    sessions: DashMap<Uuid, ScanSession>,
}

impl ScannerService {
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

    pub fn open_session(
        &self,
        workflow: ScanWorkflow,
        order_id: Option<Uuid>,
    ) -> ScanSessionView {
        let session = ScanSession {
            id: Uuid::new_v4(),
            workflow,
            order_id,
            audio_enabled: true,
            primary: None,
            primary_code: None,
            complement: None,
            complement_code: None,
            opened_at: Utc::now(),
        };
        let view = session.view();
        self.sessions.insert(session.id, session);
        info!("Scan session {} opened ({:?})", view.id, workflow);
        view
    }

    pub fn get_session(&self, session_id: Uuid) -> Result<ScanSessionView, ServiceError> {
        self.sessions
            .get(&session_id)
            .map(|s| s.view())
            .ok_or_else(|| session_not_found(session_id))
    }

    /// Toggles audio feedback. Advisory only; no effect on scan state.
    pub fn set_audio(
        &self,
        session_id: Uuid,
        enabled: bool,
    ) -> Result<ScanSessionView, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.audio_enabled = enabled;
        Ok(session.view())
    }

    /// Clears scanned entities so the operator can start the pair over.
    pub fn reset(&self, session_id: Uuid) -> Result<ScanSessionView, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.primary = None;
        session.primary_code = None;
        session.complement = None;
        session.complement_code = None;
        Ok(session.view())
    }

    /// Processes one scanned code against the session's current phase.
    #[instrument(skip(self), fields(session_id = %session_id, code = %code))]
    pub async fn scan(&self, session_id: Uuid, code: &str) -> Result<ScanFeedback, ServiceError> {
        let session = self
            .sessions
            .get(&session_id)
            .map(|s| s.clone())
            .ok_or_else(|| session_not_found(session_id))?;

        let phase = session.phase();
        if phase == ScanPhase::ReadyToConfirm {
            let feedback = ScanFeedback {
                outcome: ScanOutcome::Rejected,
                tone: tone_for(&session, ScanOutcome::Rejected),
                phase,
                entity: None,
                message: Some("both scans captured; confirm or reset".to_string()),
            };
            self.log_scan(&session, code, ScanStage::Confirm, ScanOutcome::Rejected, None)
                .await;
            return Ok(feedback);
        }

        let stage = match phase {
            ScanPhase::AwaitingPrimary => ScanStage::Primary,
            _ => ScanStage::Complement,
        };

        let resolved = self.backend.resolve_barcode(code).await?;

        let (outcome, message) = match &resolved {
            None => (ScanOutcome::Unresolved, Some(format!("'{}' not recognized", code))),
            Some(entity) => {
                if accepts(session.workflow, stage, entity) {
                    (ScanOutcome::Accepted, None)
                } else {
                    (
                        ScanOutcome::Rejected,
                        Some(format!(
                            "expected {} scan, got {}",
                            expected_kinds(session.workflow, stage),
                            entity.kind()
                        )),
                    )
                }
            }
        };

        // Audit every scan, including misses; outcome of the audit call
        // itself never blocks the scan flow.
        self.log_scan(
            &session,
            code,
            stage,
            outcome,
            resolved.as_ref().map(|e| e.kind()),
        )
        .await;

        let mut entity_for_response = resolved.clone();
        if outcome == ScanOutcome::Accepted {
            if let Some(entity) = resolved {
                let mut stored = self
                    .sessions
                    .get_mut(&session_id)
                    .ok_or_else(|| session_not_found(session_id))?;
                // Product scanner only ever reports the lookup result.
                if stored.workflow != ScanWorkflow::Product {
                    match stage {
                        ScanStage::Primary => {
                            stored.primary = Some(entity.clone());
                            stored.primary_code = Some(code.to_string());
                        }
                        _ => {
                            stored.complement = Some(entity.clone());
                            stored.complement_code = Some(code.to_string());
                        }
                    }
                }
                entity_for_response = Some(entity);
            }
        }

        let current = self
            .sessions
            .get(&session_id)
            .map(|s| (s.phase(), s.audio_enabled))
            .ok_or_else(|| session_not_found(session_id))?;

        Ok(ScanFeedback {
            outcome,
            tone: current.1.then(|| ScanTone::for_outcome(outcome)),
            phase: current.0,
            entity: entity_for_response,
            message,
        })
    }

    /// Commits the scanned pair: ship sessions record dock arrival for their
    /// order, put-away sessions confirm the bin. On success the pair is
    /// cleared so the operator can keep scanning.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn confirm(&self, session_id: Uuid) -> Result<ScanFeedback, ServiceError> {
        let session = self
            .sessions
            .get(&session_id)
            .map(|s| s.clone())
            .ok_or_else(|| session_not_found(session_id))?;

        if session.workflow == ScanWorkflow::Product {
            return Err(ServiceError::InvalidOperation(
                "product scanner has no confirm action".to_string(),
            ));
        }
        if session.phase() != ScanPhase::ReadyToConfirm {
            return Err(ServiceError::InvalidOperation(
                "scan a product and its target before confirming".to_string(),
            ));
        }

        let result = match session.workflow {
            ScanWorkflow::Ship => self.confirm_ship(&session).await,
            ScanWorkflow::Putaway => self.confirm_putaway(&session).await,
            ScanWorkflow::Product => unreachable!("checked above"),
        };

        let code = session
            .complement_code
            .clone()
            .or_else(|| session.primary_code.clone())
            .unwrap_or_else(|| "confirm".to_string());

        match result {
            Ok(()) => {
                self.log_scan(&session, &code, ScanStage::Confirm, ScanOutcome::Confirmed, None)
                    .await;
                self.event_sender
                    .send_or_log(Event::ScanCommitted {
                        workflow: session.workflow,
                        outcome: ScanOutcome::Confirmed,
                    })
                    .await;

                let view = self.reset(session_id)?;
                Ok(ScanFeedback {
                    outcome: ScanOutcome::Confirmed,
                    tone: session
                        .audio_enabled
                        .then(|| ScanTone::for_outcome(ScanOutcome::Confirmed)),
                    phase: view.phase,
                    entity: None,
                    message: None,
                })
            }
            Err(err) => {
                self.log_scan(&session, &code, ScanStage::Confirm, ScanOutcome::Failed, None)
                    .await;
                Err(err)
            }
        }
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

    async fn confirm_ship(&self, session: &ScanSession) -> Result<(), ServiceError> {
        let order_id = session.order_id.ok_or_else(|| {
            ServiceError::InvalidOperation(
                "ship scanner needs an order to record arrival against".to_string(),
            )
        })?;
        self.order_status
            .advance_status(order_id, InboundOrderStatus::Arrived)
            .await?;
        Ok(())
    }

    async fn confirm_putaway(&self, session: &ScanSession) -> Result<(), ServiceError> {
        let product = match &session.primary {
            Some(ScannedEntity::Product(product)) => product.clone(),
            _ => {
                return Err(ServiceError::InvalidOperation(
                    "put-away confirm needs a scanned product".to_string(),
                ))
            }
        };
        let sublocation = match &session.complement {
            Some(ScannedEntity::Sublocation(sublocation)) => sublocation.clone(),
            _ => {
                return Err(ServiceError::InvalidOperation(
                    "put-away confirm needs a scanned sublocation".to_string(),
                ))
            }
        };

        self.backend
            .confirm_put_away(product.id, sublocation.location_id, sublocation.id)
            .await?;

        self.event_sender
            .send_or_log(Event::PutAwayConfirmed {
                product_id: product.id,
                location_id: sublocation.location_id,
                sublocation_id: sublocation.id,
            })
            .await;
        Ok(())
    }

    async fn log_scan(
        &self,
        session: &ScanSession,
        code: &str,
        stage: ScanStage,
        outcome: ScanOutcome,
        entity_kind: Option<&str>,
    ) {
        let event = ScanEvent {
            code: code.to_string(),
            workflow: session.workflow,
            stage,
            outcome,
            entity_kind: entity_kind.map(str::to_string),
            scanned_at: Utc::now(),
        };
        if let Err(err) = self.backend.log_scan_event(&event).await {
            error!("Failed to log scan event: {}", err);
        }
    }
}

fn session_not_found(session_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("scan session {} not found", session_id))
}

fn tone_for(session: &ScanSession, outcome: ScanOutcome) -> Option<ScanTone> {
    session.audio_enabled.then(|| ScanTone::for_outcome(outcome))
}

/// Which entity kinds each workflow accepts at each stage.
fn accepts(workflow: ScanWorkflow, stage: ScanStage, entity: &ScannedEntity) -> bool {
    match (workflow, stage) {
        (ScanWorkflow::Ship, ScanStage::Primary) => {
            matches!(entity, ScannedEntity::Product(_) | ScannedEntity::Pallet(_))
        }
        (ScanWorkflow::Ship, ScanStage::Complement) => {
            matches!(entity, ScannedEntity::Location(_))
        }
        (ScanWorkflow::Putaway, ScanStage::Primary) => {
            matches!(entity, ScannedEntity::Product(_))
        }
        (ScanWorkflow::Putaway, ScanStage::Complement) => {
            matches!(entity, ScannedEntity::Sublocation(_))
        }
        (ScanWorkflow::Product, ScanStage::Primary) => {
            matches!(entity, ScannedEntity::Product(_))
        }
        _ => false,
    }
}

fn expected_kinds(workflow: ScanWorkflow, stage: ScanStage) -> &'static str {
    match (workflow, stage) {
        (ScanWorkflow::Ship, ScanStage::Primary) => "product or pallet",
        (ScanWorkflow::Ship, ScanStage::Complement) => "location",
        (ScanWorkflow::Putaway, ScanStage::Primary) => "product",
        (ScanWorkflow::Putaway, ScanStage::Complement) => "sublocation",
        (ScanWorkflow::Product, _) => "product",
        _ => "nothing",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceptance_matrix_matches_workflows() {
        use crate::models::{Location, ProductRef, Sublocation};

        let product = ScannedEntity::Product(ProductRef {
            id: Uuid::new_v4(),
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            lot_tracking_enabled: false,
        });
        let location = ScannedEntity::Location(Location {
            id: Uuid::new_v4(),
            code: "RCV".to_string(),
            name: "Receiving".to_string(),
        });
        let sublocation = ScannedEntity::Sublocation(Sublocation {
            id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            code: "A-01".to_string(),
        });

        assert!(accepts(ScanWorkflow::Ship, ScanStage::Primary, &product));
        assert!(accepts(ScanWorkflow::Ship, ScanStage::Complement, &location));
        assert!(!accepts(ScanWorkflow::Ship, ScanStage::Complement, &sublocation));
        assert!(accepts(ScanWorkflow::Putaway, ScanStage::Primary, &product));
        assert!(accepts(
            ScanWorkflow::Putaway,
            ScanStage::Complement,
            &sublocation
        ));
        assert!(!accepts(ScanWorkflow::Putaway, ScanStage::Complement, &location));
        assert!(accepts(ScanWorkflow::Product, ScanStage::Primary, &product));
        assert!(!accepts(ScanWorkflow::Product, ScanStage::Complement, &product));
    }
}
