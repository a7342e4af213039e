// Warden Core - Process configuration
//
// Configuration is consumed once at construction time and is immutable for
// the process lifetime; there is no live reload. Validation happens here,
// so evaluation never has to re-check rule shape.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WardenError, WardenResult};
use crate::rules::RuleSet;
use crate::{DEFAULT_APPROVAL_TIMEOUT_SECS, DEFAULT_COST_LIMIT};

/// Configuration for the warden core
///
/// Example:
/// ```yaml
/// cost_limit: 100.0
/// policy_version: v1
/// approval_timeout_secs: 300
/// audit_path: logs.jsonl
/// rules:
///   spend_money:
///     kind: cost
///     field: cost
///   delete_data:
///     kind: fixed
///     level: high
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WardenConfig {
    /// Rule set keyed by action type
    #[serde(default)]
    pub rules: RuleSet,

    /// Base cost limit for cost rules without explicit thresholds
    #[serde(default = "default_cost_limit")]
    pub cost_limit: f64,

    /// Version tag stamped onto every audit record
    #[serde(default = "default_policy_version")]
    pub policy_version: String,

    /// How long a high-risk request waits for a decision before timing out
    #[serde(default = "default_approval_timeout_secs")]
    pub approval_timeout_secs: u64,

    /// JSONL audit log path, for file-backed deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_path: Option<PathBuf>,
}

fn default_cost_limit() -> f64 {
    DEFAULT_COST_LIMIT
}

fn default_policy_version() -> String {
    "v1".to_string()
}

fn default_approval_timeout_secs() -> u64 {
    DEFAULT_APPROVAL_TIMEOUT_SECS
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::new(),
            cost_limit: default_cost_limit(),
            policy_version: default_policy_version(),
            approval_timeout_secs: default_approval_timeout_secs(),
            audit_path: None,
        }
    }
}

impl WardenConfig {
    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> WardenResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| WardenError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> WardenResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WardenError::config(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> WardenResult<()> {
        if !self.cost_limit.is_finite() || self.cost_limit <= 0.0 {
            return Err(WardenError::config(format!(
                "cost_limit must be positive and finite, got {}",
                self.cost_limit
            )));
        }
        if self.approval_timeout_secs == 0 {
            return Err(WardenError::config(
                "approval_timeout_secs must be greater than zero",
            ));
        }
        if self.policy_version.is_empty() {
            return Err(WardenError::config("policy_version must not be empty"));
        }
        self.rules.validate(self.cost_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.cost_limit, 100.0);
        assert_eq!(config.policy_version, "v1");
        assert_eq!(config.approval_timeout_secs, 300);
        assert!(config.rules.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
cost_limit: 100.0
policy_version: v2
approval_timeout_secs: 60
audit_path: logs.jsonl
rules:
  spend_money:
    kind: cost
    field: cost
  delete_data:
    kind: fixed
    level: high
"#;
        let config = WardenConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.policy_version, "v2");
        assert_eq!(config.approval_timeout_secs, 60);
        assert_eq!(config.audit_path.as_deref(), Some(Path::new("logs.jsonl")));
        assert!(matches!(
            config.rules.get("spend_money"),
            Some(Rule::Cost { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(WardenConfig::from_yaml_str("cost_limit: [nope").is_err());
    }

    #[test]
    fn test_bad_values_rejected_at_load() {
        assert!(WardenConfig::from_yaml_str("cost_limit: -5").is_err());
        assert!(WardenConfig::from_yaml_str("approval_timeout_secs: 0").is_err());
        assert!(WardenConfig::from_yaml_str("policy_version: \"\"").is_err());

        let inverted = r#"
rules:
  spend_money:
    kind: cost
    field: cost
    low_max: 200.0
    medium_max: 100.0
"#;
        assert!(WardenConfig::from_yaml_str(inverted).is_err());
    }
}
