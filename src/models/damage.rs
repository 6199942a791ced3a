use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DamageSeverity {
    Minor,
    Major,
    Writeoff,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DamageReport {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub severity: DamageSeverity,
    pub description: String,
    #[serde(default)]
    pub estimated_value: Option<Decimal>,
    pub reported_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewDamageReport {
    pub order_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub severity: DamageSeverity,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub estimated_value: Option<Decimal>,
}

/// Filter for listing damage reports. Empty filter lists everything.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DamageReportFilter {
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub product_id: Option<Uuid>,
}
