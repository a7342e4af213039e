// Warden Core - Declarative risk rules
//
// A rule set maps an action type to exactly one rule. Rule shape is
// validated when configuration is loaded, so evaluation stays a total
// lookup; the only runtime failure left is reading action metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};
use crate::risk::RiskLevel;

/// Policy unit keyed by action type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Classify by a numeric metadata field against two cost bands.
    ///
    /// `value <= low_max` is low risk, `value <= medium_max` is medium,
    /// anything above is high. Boundaries are inclusive on the low side.
    /// Omitted bounds default to the base cost limit and twice the base
    /// cost limit.
    Cost {
        /// Metadata field holding the numeric cost
        field: String,
        /// Upper bound of the low band
        #[serde(default, skip_serializing_if = "Option::is_none")]
        low_max: Option<f64>,
        /// Upper bound of the medium band
        #[serde(default, skip_serializing_if = "Option::is_none")]
        medium_max: Option<f64>,
    },

    /// Always classify at a constant level
    Fixed {
        /// The constant risk level
        level: RiskLevel,
    },
}

impl Rule {
    /// Validate rule shape against the base cost limit.
    ///
    /// Called at configuration load time, never during evaluation.
    pub fn validate(&self, cost_limit: f64) -> WardenResult<()> {
        match self {
            Self::Fixed { .. } => Ok(()),
            Self::Cost {
                field,
                low_max,
                medium_max,
            } => {
                if field.is_empty() {
                    return Err(WardenError::config("cost rule has an empty field name"));
                }
                let low = low_max.unwrap_or(cost_limit);
                let medium = medium_max.unwrap_or(cost_limit * 2.0);
                if !low.is_finite() || !medium.is_finite() {
                    return Err(WardenError::config(format!(
                        "cost rule for field '{}' has non-finite thresholds",
                        field
                    )));
                }
                if low >= medium {
                    return Err(WardenError::config(format!(
                        "cost rule for field '{}' requires low bound {} < medium bound {}",
                        field, low, medium
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Rule applied to action types that have no entry in the rule set.
///
/// The fallback is explicit: unknown action types are fixed low risk and
/// are auto-approved, never a silent failure.
pub const DEFAULT_RULE: Rule = Rule::Fixed {
    level: RiskLevel::Low,
};

/// Mapping from action type to its rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: HashMap<String, Rule>,
}

impl RuleSet {
    /// Create an empty rule set (every action falls back to [`DEFAULT_RULE`])
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a plain map
    pub fn from_rules(rules: HashMap<String, Rule>) -> Self {
        Self { rules }
    }

    /// Register a rule for an action type
    pub fn insert(&mut self, action_type: impl Into<String>, rule: Rule) {
        self.rules.insert(action_type.into(), rule);
    }

    /// Look up the configured rule for an action type.
    ///
    /// Returns `None` for unconfigured types; the evaluator substitutes
    /// [`DEFAULT_RULE`] in that case.
    pub fn get(&self, action_type: &str) -> Option<&Rule> {
        self.rules.get(action_type)
    }

    /// Number of explicitly configured rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are configured
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate every rule against the base cost limit
    pub fn validate(&self, cost_limit: f64) -> WardenResult<()> {
        for (action_type, rule) in &self.rules {
            rule.validate(cost_limit).map_err(|e| {
                WardenError::config(format!("rule for '{}' is invalid: {}", action_type, e))
            })?;
        }
        Ok(())
    }
}
