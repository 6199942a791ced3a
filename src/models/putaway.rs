use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// System-suggested sublocation for a received quantity, with a
/// human-readable reason the floor operator sees next to the suggestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PutAwaySuggestion {
    pub sublocation_id: Uuid,
    pub sublocation_code: String,
    pub reason: String,
}
