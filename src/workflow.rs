use crate::store::IssueStore;
use crate::transform::backend_code;
use crate::types::{Assignee, Issue, IssueId, IssueStatus, Roster, WorkerId};

/// Why a workflow action was refused. Every variant leaves the store as it
/// was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("issue {0} not found")]
    IssueNotFound(IssueId),
    #[error("worker {0} not found")]
    WorkerNotFound(WorkerId),
    #[error("issue {id} cannot move from {from} to {to}")]
    IllegalTransition {
        id: IssueId,
        from: IssueStatus,
        to: IssueStatus,
    },
    #[error("issue {0} is {1} and can no longer be assigned")]
    AssignmentClosed(IssueId, IssueStatus),
    #[error("{0} is set by assigning a worker, not by a status update")]
    NotPersistable(IssueStatus),
    #[error("a status update for issue {0} is already in flight")]
    UpdateInFlight(IssueId),
}

// ---------------------------------------------------------------------------
// Transition graph
// ---------------------------------------------------------------------------

/// Statuses reachable from `from` in one step.
pub fn next_statuses(from: IssueStatus) -> &'static [IssueStatus] {
    use IssueStatus::*;
    match from {
        Pending => &[Assigned],
        Assigned => &[InProgress],
        InProgress => &[WorkCompleted],
        WorkCompleted => &[Verified, Rejected],
        Rejected => &[InProgress],
        Verified => &[],
    }
}

pub fn can_transition(from: IssueStatus, to: IssueStatus) -> bool {
    next_statuses(from).contains(&to)
}

/// Targets a status update can be sent for: legal next steps that have a
/// backend code.
pub fn update_targets(from: IssueStatus) -> Vec<IssueStatus> {
    next_statuses(from)
        .iter()
        .copied()
        .filter(|s| backend_code(*s).is_some())
        .collect()
}

/// Statuses at which a worker may still be (re)assigned. Rejected work goes
/// back for rework and can change hands first.
pub fn accepts_assignment(status: IssueStatus) -> bool {
    status != IssueStatus::Verified
}

// ---------------------------------------------------------------------------
// Status updates
// ---------------------------------------------------------------------------

/// A validated status change, ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: IssueId,
    pub from: IssueStatus,
    pub to: IssueStatus,
    pub code: &'static str,
}

/// Validate a status change locally, before any network call.
pub fn plan_status_update(
    store: &IssueStore,
    id: &IssueId,
    to: IssueStatus,
) -> Result<StatusUpdate, WorkflowError> {
    let issue = store
        .get(id)
        .ok_or_else(|| WorkflowError::IssueNotFound(id.clone()))?;
    let code = backend_code(to).ok_or(WorkflowError::NotPersistable(to))?;
    if !can_transition(issue.status, to) {
        tracing::warn!(
            "workflow: rejected transition for {id}: {} -> {to}",
            issue.status
        );
        return Err(WorkflowError::IllegalTransition {
            id: id.clone(),
            from: issue.status,
            to,
        });
    }
    Ok(StatusUpdate {
        id: id.clone(),
        from: issue.status,
        to,
        code,
    })
}

/// Apply a status the backend has acknowledged. Keeps the record invariants:
/// work proof only survives at statuses that carry one.
pub fn apply_confirmed_status(store: &mut IssueStore, id: &IssueId, to: IssueStatus) -> bool {
    store
        .update(id, |issue| set_confirmed_status(issue, to))
        .is_some()
}

pub(crate) fn set_confirmed_status(issue: &mut Issue, to: IssueStatus) {
    issue.status = to;
    if !to.carries_work_proof() {
        issue.work_proof = None;
    }
    if to == IssueStatus::Pending {
        issue.assigned_to = Assignee::Unassigned;
    } else if issue.assigned_to.is_unassigned() {
        issue.assigned_to = Assignee::Worker(format!("{} team", issue.department));
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Outcome of a successful assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: IssueId,
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub status: IssueStatus,
}

/// Bind an issue to a roster worker. Pending issues become Assigned; issues
/// further along keep their status. Only the targeted record changes.
pub fn assign(
    store: &mut IssueStore,
    roster: &Roster,
    id: &IssueId,
    worker_id: WorkerId,
) -> Result<Assignment, WorkflowError> {
    let issue = store
        .get(id)
        .ok_or_else(|| WorkflowError::IssueNotFound(id.clone()))?;
    let worker = roster
        .find(worker_id)
        .ok_or(WorkflowError::WorkerNotFound(worker_id))?;
    if !accepts_assignment(issue.status) {
        return Err(WorkflowError::AssignmentClosed(id.clone(), issue.status));
    }

    let name = worker.name.clone();
    let updated = store.update(id, |issue| bind_worker(issue, &name));
    let status = updated.map_or(IssueStatus::Assigned, |i| i.status);
    tracing::debug!("workflow: assigned {id} to {name} ({status})");
    Ok(Assignment {
        id: id.clone(),
        worker_id,
        worker_name: name,
        status,
    })
}

pub(crate) fn bind_worker(issue: &mut Issue, name: &str) {
    issue.assigned_to = Assignee::Worker(name.to_owned());
    if issue.status == IssueStatus::Pending {
        issue.status = IssueStatus::Assigned;
    }
}
