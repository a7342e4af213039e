// Warden Core - Risk levels
//
// Closed, totally ordered enumeration. Which levels require approval is a
// policy invariant of the system, not configuration: only High suspends
// the caller for a human decision.

use serde::{Deserialize, Serialize};

/// Risk level of an intercepted action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Routine operation, always auto-approved
    Low,
    /// Elevated but tolerated operation, always auto-approved
    Medium,
    /// Requires a human decision before proceeding
    High,
}

impl RiskLevel {
    /// Whether this level mandates human approval.
    ///
    /// Changing which levels require approval is a breaking change, so this
    /// is deliberately not configurable.
    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}
