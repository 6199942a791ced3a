pub mod checklist;
pub mod damage_reports;
pub mod order_status;
pub mod putaway;
pub mod receiving;
pub mod reconciliation;
pub mod scanner;
pub mod support;
