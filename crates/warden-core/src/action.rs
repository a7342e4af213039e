// Warden Core - Normalized action record
//
// An Action is what the framework-specific normalizer hands the core: an
// open-ended type string plus action-specific metadata. The core never
// inspects how it was produced.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};

/// Normalized description of an intercepted side-effecting call.
///
/// The `type` is open-ended on purpose: new action types are added by
/// configuration, not by touching core code. An action is immutable once
/// constructed and is consumed within a single evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action category, e.g. "spend_money" or "send_email"
    #[serde(rename = "type")]
    pub action_type: String,

    /// Action-specific details, e.g. a numeric cost or a recipient count
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Action {
    /// Create an action with empty metadata
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry (builder style)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Read a numeric metadata field.
    ///
    /// Fails if the field is absent or not a number. A missing cost is
    /// never defaulted to zero: an action a rule cannot read must not be
    /// classified at all.
    pub fn numeric_field(&self, field: &str) -> WardenResult<f64> {
        let value = self
            .metadata
            .get(field)
            .ok_or_else(|| WardenError::MissingCostField {
                action_type: self.action_type.clone(),
                field: field.to_string(),
            })?;

        value.as_f64().ok_or_else(|| WardenError::NonNumericCost {
            action_type: self.action_type.clone(),
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_field_reads_integers_and_floats() {
        let action = Action::new("spend_money")
            .with_metadata("cost", 50)
            .with_metadata("rate", 0.25);

        assert_eq!(action.numeric_field("cost").unwrap(), 50.0);
        assert_eq!(action.numeric_field("rate").unwrap(), 0.25);
    }

    #[test]
    fn test_missing_field_is_an_error_not_zero() {
        let action = Action::new("spend_money");
        let err = action.numeric_field("cost").unwrap_err();
        assert!(matches!(err, WardenError::MissingCostField { .. }));
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let action = Action::new("spend_money").with_metadata("cost", "a lot");
        let err = action.numeric_field("cost").unwrap_err();
        assert!(matches!(err, WardenError::NonNumericCost { .. }));
    }

    #[test]
    fn test_serde_uses_type_field_name() {
        let action = Action::new("call_api").with_metadata("endpoint", "https://example.com");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "call_api");
        assert_eq!(json["metadata"]["endpoint"], "https://example.com");
    }
}
