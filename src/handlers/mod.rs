pub mod checklist;
pub mod common;
pub mod damage_reports;
pub mod inbound_orders;
pub mod locations;
pub mod putaway;
pub mod receiving;
pub mod scanners;

use std::sync::Arc;

use crate::client::WarehouseBackend;
use crate::events::EventSender;
use crate::services::{
    checklist::ChecklistService, damage_reports::DamageReportService,
    order_status::OrderStatusService, putaway::PutAwayService, receiving::ReceivingService,
    scanner::ScannerService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates workflow logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub order_status: Arc<OrderStatusService>,
    pub receiving: Arc<ReceivingService>,
    pub putaway: Arc<PutAwayService>,
    pub scanner: Arc<ScannerService>,
    pub checklist: Arc<ChecklistService>,
    pub damage_reports: Arc<DamageReportService>,
}

impl AppServices {
    pub fn new(backend: Arc<dyn WarehouseBackend>, event_sender: EventSender) -> Self {
        let order_status = Arc::new(OrderStatusService::new(
            backend.clone(),
            event_sender.clone(),
        ));
        let receiving = Arc::new(ReceivingService::new(
            backend.clone(),
            event_sender.clone(),
            order_status.clone(),
        ));
        let putaway = Arc::new(PutAwayService::new(backend.clone(), event_sender.clone()));
        let scanner = Arc::new(ScannerService::new(
            backend.clone(),
            event_sender.clone(),
            order_status.clone(),
        ));
        let checklist = Arc::new(ChecklistService::new(backend.clone()));
        let damage_reports = Arc::new(DamageReportService::new(backend, event_sender));

        Self {
            order_status,
            receiving,
            putaway,
            scanner,
            checklist,
            damage_reports,
        }
    }
}
