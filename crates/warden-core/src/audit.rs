// Warden Core - Append-only audit trail
//
// The audit log is the sole correctness evidence of the system: exactly one
// `allowed` record per auto-approved action, one `paused` record when a
// high-risk request is created, and one terminal record when it resolves.
// Records are never mutated or removed, and a failed write is fatal to the
// path that attempted it.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::Action;
use crate::error::{WardenError, WardenResult};
use crate::evaluator::RiskAssessment;
use crate::request::{ApprovalRequest, ApprovalStatus};
use crate::risk::RiskLevel;

/// Decision outcome recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Low or medium risk, auto-approved
    Allowed,
    /// High risk, execution suspended for a human decision
    Paused,
    /// A human approved the request
    Approved,
    /// A human denied the request
    Denied,
    /// The request expired without a decision
    TimedOut,
}

impl From<ApprovalStatus> for Decision {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => Self::Paused,
            ApprovalStatus::Approved => Self::Approved,
            ApprovalStatus::Denied => Self::Denied,
            ApprovalStatus::TimedOut => Self::TimedOut,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed => write!(f, "allowed"),
            Self::Paused => write!(f, "paused"),
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// One immutable entry in the audit trail.
///
/// Field names are a compatibility contract for downstream readers: new
/// fields may be added, existing ones are never renamed or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// Version tag of the policy that produced the decision
    pub policy_version: String,
    /// Correlation id shared by the paused and terminal records of one request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    /// Action category
    pub action_type: String,
    /// Classified risk level
    pub risk: RiskLevel,
    /// Cost read by a cost rule, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Deterministic justification for the classification
    pub explanation: String,
    /// The recorded outcome
    pub decision: Decision,
    /// Identity supplied by the human actor (approved/denied only).
    ///
    /// Persisted as `approved_by` regardless of verdict, so existing log
    /// consumers keep working.
    #[serde(rename = "approved_by", skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

impl DecisionRecord {
    /// Record for an auto-approved low or medium risk action
    pub fn allowed(action: &Action, assessment: &RiskAssessment, policy_version: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            policy_version: policy_version.to_string(),
            request_id: None,
            action_type: action.action_type.clone(),
            risk: assessment.level,
            cost: assessment.cost,
            explanation: assessment.explanation.clone(),
            decision: Decision::Allowed,
            decided_by: None,
        }
    }

    /// Record written at the moment a high-risk request is created
    pub fn paused(request: &ApprovalRequest, cost: Option<f64>, policy_version: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            policy_version: policy_version.to_string(),
            request_id: Some(request.id),
            action_type: request.action.action_type.clone(),
            risk: RiskLevel::High,
            cost,
            explanation: request.explanation.clone(),
            decision: Decision::Paused,
            decided_by: None,
        }
    }

    /// Terminal record for a resolved or expired request
    pub fn terminal(
        request: &ApprovalRequest,
        status: ApprovalStatus,
        cost: Option<f64>,
        decided_by: Option<String>,
        policy_version: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            policy_version: policy_version.to_string(),
            request_id: Some(request.id),
            action_type: request.action.action_type.clone(),
            risk: RiskLevel::High,
            cost,
            explanation: request.explanation.clone(),
            decision: status.into(),
            decided_by,
        }
    }
}

/// Append-only sink of decision records.
///
/// `append` must write each record atomically as one unit and must never
/// fail silently; implementations propagate write failures so an
/// unrecorded decision is surfaced as an error, not a degraded mode.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &DecisionRecord) -> WardenResult<()>;
}

/// File-backed audit log, one JSON object per line.
///
/// The mutex covers serialization and the write so concurrent appends from
/// multiple action streams never interleave partial records.
pub struct JsonlAuditLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl JsonlAuditLog {
    /// Open (or create) the log file in append mode
    pub fn open(path: impl AsRef<Path>) -> WardenResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| WardenError::AuditWrite(format!("open {}: {}", path.display(), e)))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back all records from a log file, skipping blank lines.
    ///
    /// This is the read side of the persisted-form contract used by
    /// downstream viewers; the core itself never reads its own log.
    pub fn read_records(path: impl AsRef<Path>) -> WardenResult<Vec<DecisionRecord>> {
        let file = File::open(path.as_ref())
            .map_err(|e| WardenError::AuditWrite(format!("open for read: {}", e)))?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| WardenError::AuditWrite(format!("read line: {}", e)))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|e| WardenError::AuditWrite(format!("malformed record: {}", e)))?;
            records.push(record);
        }
        Ok(records)
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, record: &DecisionRecord) -> WardenResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| WardenError::AuditWrite(format!("serialize record: {}", e)))?;
        let mut file = self.file.lock();
        writeln!(file, "{}", line)
            .and_then(|_| file.flush())
            .map_err(|e| WardenError::AuditWrite(format!("write {}: {}", self.path.display(), e)))
    }
}

/// In-process audit log for tests and embedded use
#[derive(Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<DecisionRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended records, in append order
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().clone()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &DecisionRecord) -> WardenResult<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_allowed() -> DecisionRecord {
        let action = Action::new("spend_money").with_metadata("cost", 50);
        let assessment = RiskAssessment {
            level: RiskLevel::Low,
            explanation: "spend_money: cost 50 is within the low band (<= 100), risk low"
                .to_string(),
            cost: Some(50.0),
        };
        DecisionRecord::allowed(&action, &assessment, "v1")
    }

    #[test]
    fn test_jsonl_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = JsonlAuditLog::open(&path).unwrap();

        log.append(&sample_allowed()).unwrap();
        log.append(&sample_allowed()).unwrap();

        let records = JsonlAuditLog::read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].decision, Decision::Allowed);
        assert_eq!(records[0].action_type, "spend_money");
        assert_eq!(records[0].cost, Some(50.0));
    }

    #[test]
    fn test_persisted_field_names() {
        let json = serde_json::to_value(sample_allowed()).unwrap();
        for field in [
            "timestamp",
            "policy_version",
            "action_type",
            "risk",
            "cost",
            "explanation",
            "decision",
        ] {
            assert!(json.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(json["decision"], "allowed");
        assert_eq!(json["risk"], "low");
        // Absent optionals are omitted, not serialized as null.
        assert!(json.get("request_id").is_none());
        assert!(json.get("approved_by").is_none());
    }

    #[test]
    fn test_actor_persists_under_the_approved_by_name() {
        let request = ApprovalRequest::new(Action::new("spend_money"), "expensive");
        let record = DecisionRecord::terminal(
            &request,
            ApprovalStatus::Denied,
            None,
            Some("bob".to_string()),
            "v1",
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["approved_by"], "bob");
        assert!(json.get("decided_by").is_none());

        // The wire name round-trips back into the struct field.
        let parsed: DecisionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.decided_by.as_deref(), Some("bob"));
    }

    #[test]
    fn test_paused_and_terminal_share_the_request_id() {
        let request = ApprovalRequest::new(
            Action::new("spend_money").with_metadata("cost", 250),
            "expensive",
        );
        let paused = DecisionRecord::paused(&request, Some(250.0), "v1");
        let terminal = DecisionRecord::terminal(
            &request,
            ApprovalStatus::Approved,
            Some(250.0),
            Some("alice".to_string()),
            "v1",
        );
        assert_eq!(paused.request_id, Some(request.id));
        assert_eq!(terminal.request_id, Some(request.id));
        assert_eq!(terminal.decision, Decision::Approved);
        assert_eq!(terminal.decided_by.as_deref(), Some("alice"));
    }

    #[test]
    fn test_write_failure_propagates() {
        let log = JsonlAuditLog::open("/nonexistent-dir/audit.jsonl");
        assert!(matches!(log, Err(WardenError::AuditWrite(_))));
    }

    #[test]
    fn test_read_records_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = JsonlAuditLog::open(&path).unwrap();
        log.append(&sample_allowed()).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"\n\n")
            .unwrap();

        let records = JsonlAuditLog::read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
    }
}
