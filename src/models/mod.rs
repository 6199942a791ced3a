pub mod checklist;
pub mod damage;
pub mod location;
pub mod order;
pub mod pallet;
pub mod putaway;
pub mod scan;
pub mod workflow_rules;

pub use checklist::ChecklistItem;
pub use damage::{DamageReport, DamageReportFilter, DamageSeverity, NewDamageReport};
pub use location::{Location, Sublocation};
pub use order::{InboundLineItem, InboundOrder, InboundOrderStatus, ProductRef};
pub use pallet::{NewPallet, Pallet, PalletContent};
pub use putaway::PutAwaySuggestion;
pub use scan::{ScanEvent, ScanOutcome, ScanStage, ScanTone, ScanWorkflow, ScannedEntity};
pub use workflow_rules::WorkflowRules;
