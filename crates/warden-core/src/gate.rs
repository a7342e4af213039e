// Warden Core - Action gate
//
// The gate is the entry point the interception layer calls for every
// normalized action: classify, then either log `allowed` and return, or
// hand the action to the coordinator and block until a human decides.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::action::Action;
use crate::audit::{AuditSink, DecisionRecord, JsonlAuditLog};
use crate::config::WardenConfig;
use crate::coordinator::ApprovalCoordinator;
use crate::error::{WardenError, WardenResult};
use crate::evaluator::RiskEvaluator;
use crate::request::ApprovalStatus;
use crate::risk::RiskLevel;

/// What the interception layer should do with the action
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// The action may proceed (auto-approved or human-approved)
    Proceed {
        risk: RiskLevel,
        explanation: String,
    },
    /// A human denied the action
    Denied { decided_by: Option<String> },
    /// No decision arrived within the configured timeout
    TimedOut,
}

impl GateOutcome {
    /// Whether the action may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Proceed { .. })
    }
}

/// Human-in-the-loop control gate for agent actions
pub struct ActionGate {
    evaluator: RiskEvaluator,
    coordinator: Arc<ApprovalCoordinator>,
    audit: Arc<dyn AuditSink>,
    policy_version: String,
}

impl ActionGate {
    /// Build a gate from configuration and an audit sink
    pub fn new(config: WardenConfig, audit: Arc<dyn AuditSink>) -> WardenResult<Self> {
        config.validate()?;
        let evaluator = RiskEvaluator::new(config.rules, config.cost_limit)?;
        let coordinator = Arc::new(ApprovalCoordinator::new(
            audit.clone(),
            Duration::from_secs(config.approval_timeout_secs),
            config.policy_version.clone(),
        ));
        Ok(Self {
            evaluator,
            coordinator,
            audit,
            policy_version: config.policy_version,
        })
    }

    /// Build a gate whose audit trail is the JSONL file named in the config.
    ///
    /// Fails if the config has no audit path; embedders supplying their own
    /// sink use [`ActionGate::new`].
    pub fn from_config(config: WardenConfig) -> WardenResult<Self> {
        let path = config
            .audit_path
            .clone()
            .ok_or_else(|| WardenError::config("config has no audit_path"))?;
        let audit: Arc<dyn AuditSink> = Arc::new(JsonlAuditLog::open(path)?);
        Self::new(config, audit)
    }

    /// The coordinator, handed to the decision delivery endpoint
    pub fn coordinator(&self) -> Arc<ApprovalCoordinator> {
        self.coordinator.clone()
    }

    /// Intercept one action.
    ///
    /// Low and medium risk actions are logged as `allowed` and return
    /// immediately. High risk actions suspend the caller until a human
    /// decision or timeout. Classification and audit failures propagate;
    /// an unclassifiable action never proceeds with an assumed level.
    pub async fn check(&self, action: Action) -> WardenResult<GateOutcome> {
        let assessment = self.evaluator.evaluate(&action)?;

        if !assessment.level.requires_approval() {
            debug!(
                action_type = %action.action_type,
                risk = %assessment.level,
                "auto-approving action"
            );
            self.audit
                .append(&DecisionRecord::allowed(&action, &assessment, &self.policy_version))?;
            return Ok(GateOutcome::Proceed {
                risk: assessment.level,
                explanation: assessment.explanation,
            });
        }

        info!(action_type = %action.action_type, "high-risk action, requesting approval");
        let explanation = assessment.explanation.clone();
        let outcome = self.coordinator.submit(action, assessment).await?;

        Ok(match outcome.status {
            ApprovalStatus::Approved => GateOutcome::Proceed {
                risk: RiskLevel::High,
                explanation,
            },
            ApprovalStatus::Denied => GateOutcome::Denied {
                decided_by: outcome.decided_by,
            },
            ApprovalStatus::TimedOut => GateOutcome::TimedOut,
            ApprovalStatus::Pending => {
                return Err(WardenError::coordination(format!(
                    "request {} returned from wait while still pending",
                    outcome.id
                )))
            }
        })
    }
}
