// Warden Core - Approval request records
//
// An ApprovalRequest exists only for high-risk actions. It is owned by the
// coordinator for its whole lifetime and transitions exactly once from
// Pending to a terminal status; the id is the sole handle the decision
// delivery endpoint ever sees.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::Action;

/// Lifecycle status of an approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for a human decision
    Pending,
    /// A human approved the action
    Approved,
    /// A human denied the action
    Denied,
    /// No decision arrived within the configured timeout
    TimedOut,
}

impl ApprovalStatus {
    /// Whether this status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// The two decisions a human may deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Denied,
}

impl From<Verdict> for ApprovalStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Approved => Self::Approved,
            Verdict::Denied => Self::Denied,
        }
    }
}

/// A high-risk action waiting for (or resolved by) a human decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique identifier, the external handle for decisions
    pub id: Uuid,
    /// The intercepted action
    pub action: Action,
    /// Why the action was classified high risk
    pub explanation: String,
    /// When the request was created
    pub created_at: DateTime<Utc>,
    /// Current status
    pub status: ApprovalStatus,
}

impl ApprovalRequest {
    /// Create a new pending request for an action
    pub fn new(action: Action, explanation: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            explanation: explanation.into(),
            created_at: Utc::now(),
            status: ApprovalStatus::Pending,
        }
    }
}

/// Read view of a pending request, served to the human-facing surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    pub id: Uuid,
    pub action_type: String,
    pub explanation: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&ApprovalRequest> for PendingApproval {
    fn from(request: &ApprovalRequest) -> Self {
        Self {
            id: request.id,
            action_type: request.action.action_type.clone(),
            explanation: request.explanation.clone(),
            metadata: request.action.metadata.clone(),
            created_at: request.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let request = ApprovalRequest::new(Action::new("spend_money"), "why");
        assert_eq!(request.status, ApprovalStatus::Pending);
        assert!(!request.status.is_terminal());
    }

    #[test]
    fn test_verdict_maps_to_terminal_status() {
        assert_eq!(
            ApprovalStatus::from(Verdict::Approved),
            ApprovalStatus::Approved
        );
        assert_eq!(ApprovalStatus::from(Verdict::Denied), ApprovalStatus::Denied);
    }

    #[test]
    fn test_status_display_matches_wire_form() {
        assert_eq!(ApprovalStatus::TimedOut.to_string(), "timed_out");
        assert_eq!(
            serde_json::to_string(&ApprovalStatus::TimedOut).unwrap(),
            "\"timed_out\""
        );
    }

    #[test]
    fn test_pending_view_carries_the_handle_and_context() {
        let request = ApprovalRequest::new(
            Action::new("spend_money").with_metadata("cost", 250),
            "too expensive",
        );
        let view = PendingApproval::from(&request);
        assert_eq!(view.id, request.id);
        assert_eq!(view.action_type, "spend_money");
        assert_eq!(view.metadata["cost"], 250);
    }
}
