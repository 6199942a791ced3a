use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Location, Pallet, ProductRef, Sublocation};

/// Entity a barcode resolved to.
///
/// Dispatch on this enum decides what a scan means for the active workflow;
/// an unresolvable code is represented by `None` at the lookup boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum ScannedEntity {
    Product(ProductRef),
    Pallet(Pallet),
    Location(Location),
    Sublocation(Sublocation),
}

impl ScannedEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            ScannedEntity::Product(_) => "product",
            ScannedEntity::Pallet(_) => "pallet",
            ScannedEntity::Location(_) => "location",
            ScannedEntity::Sublocation(_) => "sublocation",
        }
    }
}

/// Which scanner screen produced a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanWorkflow {
    Ship,
    Putaway,
    Product,
}

/// Stage of the two-phase scan flow a scan event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    Primary,
    Complement,
    Confirm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Resolved to an entity kind the current stage accepts.
    Accepted,
    /// Resolved, but to a kind the current stage does not accept.
    Rejected,
    /// The code did not resolve to anything.
    Unresolved,
    /// A confirm action committed.
    Confirmed,
    /// A confirm action failed at the backend.
    Failed,
}

/// Audit record for a single scan. Logged for every scan regardless of
/// whether it led to a committed action.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ScanEvent {
    pub code: String,
    pub workflow: ScanWorkflow,
    pub stage: ScanStage,
    pub outcome: ScanOutcome,
    #[serde(default)]
    pub entity_kind: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

/// Advisory audio feedback for the handheld. Has no effect on state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanTone {
    Success,
    Failure,
}

impl ScanTone {
    pub fn for_outcome(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Accepted | ScanOutcome::Confirmed => ScanTone::Success,
            ScanOutcome::Rejected | ScanOutcome::Unresolved | ScanOutcome::Failed => {
                ScanTone::Failure
            }
        }
    }
}
