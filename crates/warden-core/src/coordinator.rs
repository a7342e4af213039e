// Warden Core - Approval coordination
//
// The coordinator owns the pending-request set and implements the blocking
// protocol: `submit` suspends the calling task until `resolve` is invoked
// for the request id or the configured timeout elapses. Resolution and
// timeout share one atomic status transition, so exactly one of them wins
// and every late arrival is rejected with AlreadyResolved.
//
// The map guard is held only for the brief insert/lookup/transition
// critical sections, never across the wait or the audit write; waits on
// different request ids are fully independent.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::audit::{AuditSink, DecisionRecord};
use crate::error::{WardenError, WardenResult};
use crate::evaluator::RiskAssessment;
use crate::request::{ApprovalRequest, ApprovalStatus, PendingApproval, Verdict};

/// What a resolution carries to the suspended waiter
struct Resolution {
    status: ApprovalStatus,
    decided_by: Option<String>,
}

/// A registered request plus the channel that unblocks its waiter
struct Entry {
    request: ApprovalRequest,
    cost: Option<f64>,
    notify: Option<oneshot::Sender<Resolution>>,
}

/// Terminal outcome returned to the caller of `submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    /// The request id, correlating with the audit trail
    pub id: Uuid,
    /// Terminal status: approved, denied, or timed out
    pub status: ApprovalStatus,
    /// Identity of the human actor, for approved/denied
    pub decided_by: Option<String>,
}

/// Coordinates suspended high-risk actions with asynchronous human decisions.
///
/// The pending set is instance-owned, so independent coordinators (e.g. in
/// tests) never interfere.
pub struct ApprovalCoordinator {
    pending: DashMap<Uuid, Entry>,
    timeout: Duration,
    audit: Arc<dyn AuditSink>,
    policy_version: String,
}

impl ApprovalCoordinator {
    /// Create a coordinator writing to the given audit sink
    pub fn new(audit: Arc<dyn AuditSink>, timeout: Duration, policy_version: impl Into<String>) -> Self {
        Self {
            pending: DashMap::new(),
            timeout,
            audit,
            policy_version: policy_version.into(),
        }
    }

    /// The configured decision timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Snapshot of currently pending requests, oldest first
    pub fn pending(&self) -> Vec<PendingApproval> {
        let mut requests: Vec<PendingApproval> = self
            .pending
            .iter()
            .filter(|entry| entry.request.status == ApprovalStatus::Pending)
            .map(|entry| PendingApproval::from(&entry.request))
            .collect();
        requests.sort_by_key(|request| request.created_at);
        requests
    }

    /// Register a high-risk action and suspend until a human decides.
    ///
    /// Appends the `paused` record before the request becomes visible, so
    /// for any request the paused record strictly precedes its terminal
    /// record in the log. Returns once `resolve` fires or the timeout
    /// elapses; the timeout and a racing decision cannot both win.
    pub async fn submit(
        &self,
        action: Action,
        assessment: RiskAssessment,
    ) -> WardenResult<ApprovalOutcome> {
        let request = ApprovalRequest::new(action, assessment.explanation);
        let id = request.id;

        self.audit
            .append(&DecisionRecord::paused(&request, assessment.cost, &self.policy_version))?;

        let (tx, mut rx) = oneshot::channel();
        self.pending.insert(
            id,
            Entry {
                request,
                cost: assessment.cost,
                notify: Some(tx),
            },
        );
        info!(request_id = %id, "action paused, waiting for human decision");

        let resolution = match tokio::time::timeout(self.timeout, &mut rx).await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(_)) => {
                return Err(WardenError::coordination(format!(
                    "request {} lost its decision channel",
                    id
                )))
            }
            Err(_elapsed) => {
                match self.transition(id, ApprovalStatus::TimedOut, None) {
                    Ok(()) => {
                        warn!(request_id = %id, "no decision within {:?}, timing out", self.timeout);
                        Resolution {
                            status: ApprovalStatus::TimedOut,
                            decided_by: None,
                        }
                    }
                    // A decision landed while the timer was firing; take it.
                    Err(WardenError::AlreadyResolved { .. }) => (&mut rx).await.map_err(|_| {
                        WardenError::coordination(format!(
                            "request {} resolved but never notified its waiter",
                            id
                        ))
                    })?,
                    Err(e) => return Err(e),
                }
            }
        };

        debug!(request_id = %id, status = %resolution.status, "waiter released");
        Ok(ApprovalOutcome {
            id,
            status: resolution.status,
            decided_by: resolution.decided_by,
        })
    }

    /// Deliver a human decision for a pending request.
    ///
    /// Safe to call concurrently with `submit` waits and with resolutions
    /// of other ids. Fails with `UnknownRequest` for an id the coordinator
    /// never saw and `AlreadyResolved` (without side effect) for a request
    /// that already reached a terminal status.
    pub fn resolve(&self, id: Uuid, verdict: Verdict, decided_by: &str) -> WardenResult<()> {
        let status = ApprovalStatus::from(verdict);
        self.transition(id, status, Some(decided_by.to_string()))?;
        info!(request_id = %id, status = %status, decided_by, "human decision recorded");
        Ok(())
    }

    /// Drop terminal requests from the set, returning how many were removed.
    ///
    /// Terminal entries are retained by default so that a late decision is
    /// rejected as AlreadyResolved rather than reported as unknown; the
    /// audit trail keeps their outcome forever either way.
    pub fn prune_terminal(&self) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, entry| !entry.request.status.is_terminal());
        before - self.pending.len()
    }

    /// The single status transition used by both resolution and timeout.
    ///
    /// The status check, status write, and channel take happen under the
    /// entry guard, so the transition is observed exactly once; the audit
    /// write and the waiter notification happen after the guard is dropped.
    fn transition(
        &self,
        id: Uuid,
        status: ApprovalStatus,
        decided_by: Option<String>,
    ) -> WardenResult<()> {
        let (record, notify) = {
            let mut entry = self
                .pending
                .get_mut(&id)
                .ok_or(WardenError::UnknownRequest(id))?;
            if entry.request.status.is_terminal() {
                return Err(WardenError::AlreadyResolved {
                    id,
                    status: entry.request.status,
                });
            }
            entry.request.status = status;
            let record = DecisionRecord::terminal(
                &entry.request,
                status,
                entry.cost,
                decided_by.clone(),
                &self.policy_version,
            );
            (record, entry.notify.take())
        };

        // The terminal record is appended before the waiter is released. A
        // failed append still unblocks the waiter but propagates as a fatal
        // error to whoever delivered the decision.
        let appended = self.audit.append(&record);
        if let Some(tx) = notify {
            let _ = tx.send(Resolution { status, decided_by });
        }
        appended
    }
}
