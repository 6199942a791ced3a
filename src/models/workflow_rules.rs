use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Highest rules schema version this service understands.
pub const SUPPORTED_RULES_VERSION: u32 = 1;

/// Per-client receiving workflow configuration.
///
/// Every field is optional on the wire and defaults to the permissive value,
/// so a client with no configured rules behaves like plain receiving. The
/// shape is versioned; `validate_loaded` rejects payloads this build cannot
/// interpret instead of guessing at unknown fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct WorkflowRules {
    pub schema_version: u32,
    /// Master switch. When false the remaining flags are ignored.
    pub enabled: bool,
    pub requires_lot_tracking: bool,
    pub requires_expiration_dates: bool,
    pub requires_inspection: bool,
    pub auto_create_lots: bool,
    /// Lot number template used when `auto_create_lots` is set. Supports
    /// `{sku}`, `{supplier}`, `{date}` and `{rand}` placeholders.
    pub lot_number_format: Option<String>,
    /// Container types accepted for pallet receiving. Empty means all.
    pub allowed_container_types: Vec<String>,
}

impl Default for WorkflowRules {
    fn default() -> Self {
        Self {
            schema_version: SUPPORTED_RULES_VERSION,
            enabled: false,
            requires_lot_tracking: false,
            requires_expiration_dates: false,
            requires_inspection: false,
            auto_create_lots: false,
            lot_number_format: None,
            allowed_container_types: Vec::new(),
        }
    }
}

impl WorkflowRules {
    /// Validates a payload freshly loaded from the backend.
    pub fn validate_loaded(&self) -> Result<(), String> {
        if self.schema_version == 0 || self.schema_version > SUPPORTED_RULES_VERSION {
            return Err(format!(
                "unsupported workflow rules schema version {} (supported: 1..={})",
                self.schema_version, SUPPORTED_RULES_VERSION
            ));
        }
        if self.auto_create_lots
            && self
                .lot_number_format
                .as_deref()
                .map_or(true, |f| f.trim().is_empty())
        {
            return Err("auto_create_lots requires a lot_number_format".to_string());
        }
        if self
            .allowed_container_types
            .iter()
            .any(|ct| ct.trim().is_empty())
        {
            return Err("allowed_container_types entries must be non-empty".to_string());
        }
        Ok(())
    }

    /// Whether client rules alone force lot capture, independent of the
    /// product's own lot-tracking flag.
    pub fn forces_lot_capture(&self) -> bool {
        self.enabled && (self.requires_lot_tracking || self.auto_create_lots)
    }

    pub fn requires_expirations(&self) -> bool {
        self.enabled && self.requires_expiration_dates
    }

    pub fn requires_inspection_hold(&self) -> bool {
        self.enabled && self.requires_inspection
    }

    pub fn auto_creates_lots(&self) -> bool {
        self.enabled && self.auto_create_lots
    }

    pub fn container_type_allowed(&self, container_type: &str) -> bool {
        self.allowed_container_types.is_empty()
            || self
                .allowed_container_types
                .iter()
                .any(|ct| ct.eq_ignore_ascii_case(container_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_are_permissive() {
        let rules = WorkflowRules::default();
        assert!(rules.validate_loaded().is_ok());
        assert!(!rules.forces_lot_capture());
        assert!(!rules.requires_expirations());
        assert!(rules.container_type_allowed("pallet"));
    }

    #[test]
    fn disabled_rules_ignore_flags() {
        let rules = WorkflowRules {
            requires_lot_tracking: true,
            requires_inspection: true,
            ..WorkflowRules::default()
        };
        assert!(!rules.forces_lot_capture());
        assert!(!rules.requires_inspection_hold());
    }

    #[test]
    fn auto_create_requires_format() {
        let rules = WorkflowRules {
            enabled: true,
            auto_create_lots: true,
            ..WorkflowRules::default()
        };
        assert!(rules.validate_loaded().is_err());

        let rules = WorkflowRules {
            lot_number_format: Some("LOT-{date}-{rand}".to_string()),
            ..rules
        };
        assert!(rules.validate_loaded().is_ok());
        assert!(rules.forces_lot_capture());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let rules = WorkflowRules {
            schema_version: 2,
            ..WorkflowRules::default()
        };
        assert!(rules.validate_loaded().is_err());
    }

    #[test]
    fn container_types_filter_when_present() {
        let rules = WorkflowRules {
            allowed_container_types: vec!["pallet".to_string(), "gaylord".to_string()],
            ..WorkflowRules::default()
        };
        assert!(rules.container_type_allowed("Pallet"));
        assert!(!rules.container_type_allowed("carton"));
    }
}
