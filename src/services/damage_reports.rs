use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::{
    client::WarehouseBackend,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{DamageReport, DamageReportFilter, NewDamageReport},
};

/// Damage report pass-through: validation here, persistence at the backend.
#[derive(Clone)]
pub struct DamageReportService {
    backend: Arc<dyn WarehouseBackend>,
    event_sender: EventSender,
}

impl DamageReportService {
    pub fn new(backend: Arc<dyn WarehouseBackend>, event_sender: EventSender) -> Self {
        Self {
            backend,
            event_sender,
        }
    }

    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        filter: DamageReportFilter,
    ) -> Result<Vec<DamageReport>, ServiceError> {
        Ok(self.backend.get_damage_reports(&filter).await?)
    }

    #[instrument(skip(self, report))]
    pub async fn create(&self, report: NewDamageReport) -> Result<DamageReport, ServiceError> {
        report
            .validate()
            .map_err(|e| ServiceError::ValidationError(format!("invalid damage report: {}", e)))?;

        let created = self.backend.create_damage_report(&report).await?;

        self.event_sender
            .send_or_log(Event::DamageReported {
                report_id: created.id,
                order_id: created.order_id,
                product_id: created.product_id,
                quantity: created.quantity,
            })
            .await;

        info!(
            "Damage report {} created for product {} on order {}",
            created.id, created.product_id, created.order_id
        );

        Ok(created)
    }
}
