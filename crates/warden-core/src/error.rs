// Warden Core - Error types
//
// Every failure in the core is caller-visible. Classification errors stop
// the action from proceeding, coordination errors are reported back to the
// decision deliverer, and an audit write failure is fatal to the path that
// attempted it. Nothing is retried and nothing falls back to an assumed
// risk level.

use uuid::Uuid;

use crate::request::ApprovalStatus;

/// Result type for warden operations
pub type WardenResult<T> = Result<T, WardenError>;

/// Errors produced by the warden core
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// A cost-based rule names a metadata field the action does not carry
    #[error("action '{action_type}' has no metadata field '{field}' required by its rule")]
    MissingCostField { action_type: String, field: String },

    /// A cost-based rule read a metadata field that is not a number
    #[error("metadata field '{field}' of action '{action_type}' is not numeric (got {value})")]
    NonNumericCost {
        action_type: String,
        field: String,
        value: String,
    },

    /// A decision referenced a request id the coordinator does not know
    #[error("unknown approval request: {0}")]
    UnknownRequest(Uuid),

    /// A decision arrived for a request that already reached a terminal status
    #[error("approval request {id} was already resolved as {status}")]
    AlreadyResolved { id: Uuid, status: ApprovalStatus },

    /// The audit log could not be written; the decision is unrecorded
    #[error("audit log write failed: {0}")]
    AuditWrite(String),

    /// Invalid rule set or configuration, rejected at load time
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal coordination fault (e.g. a waiter lost its channel)
    #[error("coordination error: {0}")]
    Coordination(String),
}

impl WardenError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a coordination error
    pub fn coordination(msg: impl Into<String>) -> Self {
        Self::Coordination(msg.into())
    }
}
