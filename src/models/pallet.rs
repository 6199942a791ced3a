use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product and quantity currently sitting on a pallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PalletContent {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A license-plated container (LPN) goods can be received onto.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pallet {
    pub id: Uuid,
    /// License Plate Number, unique per container.
    pub lpn: String,
    pub container_type: String,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub contents: Vec<PalletContent>,
}

/// Request to create a pallet at receive time. When `lpn` is omitted the
/// backend assigns one.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewPallet {
    #[serde(default)]
    pub lpn: Option<String>,
    #[validate(length(min = 1))]
    pub container_type: String,
    pub location_id: Uuid,
}
