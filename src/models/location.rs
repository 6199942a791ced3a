use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

/// A bin/shelf subdivision within a location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Sublocation {
    pub id: Uuid,
    pub location_id: Uuid,
    pub code: String,
}
