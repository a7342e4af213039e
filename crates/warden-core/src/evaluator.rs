// Warden Core - Risk evaluation
//
// Pure function from (action, rule set, cost limit) to a risk level and a
// deterministic explanation. No state, no I/O; safe to call concurrently
// from any number of action streams.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{WardenError, WardenResult};
use crate::risk::RiskLevel;
use crate::rules::{Rule, RuleSet, DEFAULT_RULE};

/// Outcome of classifying one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// The classified risk level
    pub level: RiskLevel,
    /// Human-readable justification; byte-identical for identical inputs
    pub explanation: String,
    /// The cost value read by a cost rule, if any (carried into the audit record)
    pub cost: Option<f64>,
}

/// Deterministic rule evaluator
///
/// Holds the immutable rule set and base cost limit for the process
/// lifetime. Rule shape is validated at construction; evaluation can only
/// fail while reading action metadata for a cost rule.
#[derive(Debug, Clone)]
pub struct RiskEvaluator {
    rules: RuleSet,
    cost_limit: f64,
}

impl RiskEvaluator {
    /// Create an evaluator, validating the rule set and cost limit
    pub fn new(rules: RuleSet, cost_limit: f64) -> WardenResult<Self> {
        if !cost_limit.is_finite() || cost_limit <= 0.0 {
            return Err(WardenError::config(format!(
                "cost limit must be positive and finite, got {}",
                cost_limit
            )));
        }
        rules.validate(cost_limit)?;
        Ok(Self { rules, cost_limit })
    }

    /// The base cost limit
    pub fn cost_limit(&self) -> f64 {
        self.cost_limit
    }

    /// Classify an action.
    ///
    /// Action types without a configured rule fall back to the documented
    /// default (fixed low). Errors mean "cannot classify" and the caller
    /// must not let the action proceed with an assumed level.
    pub fn evaluate(&self, action: &Action) -> WardenResult<RiskAssessment> {
        let (rule, configured) = match self.rules.get(&action.action_type) {
            Some(rule) => (rule, true),
            None => (&DEFAULT_RULE, false),
        };

        match rule {
            Rule::Fixed { level } => {
                let explanation = if configured {
                    format!(
                        "{}: fixed rule classifies this action as {} risk",
                        action.action_type, level
                    )
                } else {
                    format!(
                        "{}: no rule configured, defaulting to {} risk",
                        action.action_type, level
                    )
                };
                Ok(RiskAssessment {
                    level: *level,
                    explanation,
                    cost: None,
                })
            }
            Rule::Cost {
                field,
                low_max,
                medium_max,
            } => {
                let value = action.numeric_field(field)?;
                let low = low_max.unwrap_or(self.cost_limit);
                let medium = medium_max.unwrap_or(self.cost_limit * 2.0);

                // Boundaries are inclusive on the low side of each band.
                let (level, explanation) = if value <= low {
                    (
                        RiskLevel::Low,
                        format!(
                            "{}: {} {} is within the low band (<= {}), risk low",
                            action.action_type, field, value, low
                        ),
                    )
                } else if value <= medium {
                    (
                        RiskLevel::Medium,
                        format!(
                            "{}: {} {} is above {} but within the medium band (<= {}), risk medium",
                            action.action_type, field, value, low, medium
                        ),
                    )
                } else {
                    (
                        RiskLevel::High,
                        format!(
                            "{}: {} {} exceeds the medium band bound {}, risk high",
                            action.action_type, field, value, medium
                        ),
                    )
                };

                Ok(RiskAssessment {
                    level,
                    explanation,
                    cost: Some(value),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> RiskEvaluator {
        let mut rules = RuleSet::new();
        rules.insert(
            "spend_money",
            Rule::Cost {
                field: "cost".to_string(),
                low_max: None,
                medium_max: None,
            },
        );
        rules.insert(
            "delete_data",
            Rule::Fixed {
                level: RiskLevel::High,
            },
        );
        RiskEvaluator::new(rules, 100.0).unwrap()
    }

    fn spend(cost: f64) -> Action {
        Action::new("spend_money").with_metadata("cost", cost)
    }

    #[test]
    fn test_cost_bands() {
        let eval = evaluator();
        assert_eq!(eval.evaluate(&spend(50.0)).unwrap().level, RiskLevel::Low);
        assert_eq!(eval.evaluate(&spend(150.0)).unwrap().level, RiskLevel::Medium);
        assert_eq!(eval.evaluate(&spend(250.0)).unwrap().level, RiskLevel::High);
    }

    #[test]
    fn test_boundaries_inclusive_on_the_low_side() {
        let eval = evaluator();
        // Exactly at a bound falls into the lower band.
        assert_eq!(eval.evaluate(&spend(100.0)).unwrap().level, RiskLevel::Low);
        assert_eq!(eval.evaluate(&spend(200.0)).unwrap().level, RiskLevel::Medium);
        assert_eq!(
            eval.evaluate(&spend(100.000001)).unwrap().level,
            RiskLevel::Medium
        );
        assert_eq!(
            eval.evaluate(&spend(200.000001)).unwrap().level,
            RiskLevel::High
        );
    }

    #[test]
    fn test_explanations_are_byte_identical() {
        let eval = evaluator();
        let action = spend(150.0);
        let a = eval.evaluate(&action).unwrap();
        let b = eval.evaluate(&action).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.explanation,
            "spend_money: cost 150 is above 100 but within the medium band (<= 200), risk medium"
        );
    }

    #[test]
    fn test_fixed_rule_and_default_fallback() {
        let eval = evaluator();

        let fixed = eval.evaluate(&Action::new("delete_data")).unwrap();
        assert_eq!(fixed.level, RiskLevel::High);
        assert!(fixed.explanation.contains("fixed rule"));
        assert_eq!(fixed.cost, None);

        let fallback = eval.evaluate(&Action::new("read_file")).unwrap();
        assert_eq!(fallback.level, RiskLevel::Low);
        assert!(fallback.explanation.contains("no rule configured"));
    }

    #[test]
    fn test_missing_and_non_numeric_cost_cannot_classify() {
        let eval = evaluator();

        let missing = eval.evaluate(&Action::new("spend_money")).unwrap_err();
        assert!(matches!(missing, WardenError::MissingCostField { .. }));

        let bad = eval
            .evaluate(&Action::new("spend_money").with_metadata("cost", "free"))
            .unwrap_err();
        assert!(matches!(bad, WardenError::NonNumericCost { .. }));
    }

    #[test]
    fn test_explicit_thresholds_override_the_base_limit() {
        let mut rules = RuleSet::new();
        rules.insert(
            "send_email",
            Rule::Cost {
                field: "recipients".to_string(),
                low_max: Some(10.0),
                medium_max: Some(100.0),
            },
        );
        let eval = RiskEvaluator::new(rules, 100.0).unwrap();

        let action = Action::new("send_email").with_metadata("recipients", 50);
        assert_eq!(eval.evaluate(&action).unwrap().level, RiskLevel::Medium);
    }

    #[test]
    fn test_invalid_cost_limit_rejected_at_construction() {
        assert!(RiskEvaluator::new(RuleSet::new(), 0.0).is_err());
        assert!(RiskEvaluator::new(RuleSet::new(), f64::NAN).is_err());
    }
}
