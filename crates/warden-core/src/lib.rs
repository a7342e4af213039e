// Warden Core - Human-in-the-loop control plane for agent actions
//
// This crate sits between an autonomous agent and the side effects of its
// tool calls. Each intercepted action is classified into a risk level by a
// deterministic rule evaluator; low and medium risk actions proceed
// immediately, high risk actions suspend the caller until a human approves
// or denies them. Every decision is appended to an immutable audit log.

pub mod action;
pub mod audit;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod evaluator;
pub mod gate;
pub mod request;
pub mod risk;
pub mod rules;

// Re-export core types
pub use action::Action;
pub use audit::{AuditSink, Decision, DecisionRecord, JsonlAuditLog, MemoryAuditLog};
pub use config::WardenConfig;
pub use coordinator::{ApprovalCoordinator, ApprovalOutcome};
pub use error::{WardenError, WardenResult};
pub use evaluator::{RiskAssessment, RiskEvaluator};
pub use gate::{ActionGate, GateOutcome};
pub use request::{ApprovalRequest, ApprovalStatus, PendingApproval, Verdict};
pub use risk::RiskLevel;
pub use rules::{Rule, RuleSet};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default base cost limit for cost-based rules
pub const DEFAULT_COST_LIMIT: f64 = 100.0;

/// Default approval timeout in seconds
pub const DEFAULT_APPROVAL_TIMEOUT_SECS: u64 = 300;
