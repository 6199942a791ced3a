use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One line of an order's arrival checklist (seal intact, temperature
/// logged, paperwork present, ...). Toggled individually by operators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub label: String,
    pub done: bool,
}
