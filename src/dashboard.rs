use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;

use crate::engine::Event;
use crate::filter::{IssueFilter, StatTile, Stats, StatusFilter, filter_issues, parse_issue_query};
use crate::performance::PerformanceReport;
use crate::store::IssueStore;
use crate::types::{Assignee, Issue, IssueId, IssueStatus, Roster, WorkerId};
use crate::workflow::{self, Assignment, StatusUpdate, WorkflowError};

/// What applying an engine event did to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Refreshed { count: usize, skipped: usize },
    /// A response older than the data on screen; ignored.
    Stale,
    StatusConfirmed { id: IssueId, status: IssueStatus },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LedgerEntry {
    worker_id: WorkerId,
    worker_name: String,
}

/// UI-agnostic dashboard state: the store, the roster, the active filter and
/// the bookkeeping around fetches and in-flight updates. Views and the CLI
/// both drive this one controller.
#[derive(Debug, Clone)]
pub struct Dashboard {
    store: IssueStore,
    roster: Roster,
    filter: IssueFilter,
    /// Local-only assignments, re-applied after every full refresh.
    ledger: IndexMap<IssueId, LedgerEntry>,
    in_flight: HashSet<IssueId>,
    next_seq: u64,
    loading: bool,
    last_error: Option<String>,
    notice: Option<String>,
    last_updated: Option<Instant>,
}

impl Dashboard {
    pub fn new(roster: Roster) -> Self {
        Self {
            store: IssueStore::new(),
            roster,
            filter: IssueFilter::default(),
            ledger: IndexMap::new(),
            in_flight: HashSet::new(),
            next_seq: 0,
            loading: false,
            last_error: None,
            notice: None,
            last_updated: None,
        }
    }

    /// A dashboard preloaded with issues, as if fetch 0 had returned them.
    pub fn with_issues(roster: Roster, issues: Vec<Issue>) -> Self {
        let mut d = Self::new(roster);
        d.store.replace_all(0, issues);
        d.last_updated = Some(Instant::now());
        d
    }

    // -- Fetch lifecycle ----------------------------------------------------

    /// Allocate the sequence number for a new full-list fetch.
    pub fn begin_fetch(&mut self) -> u64 {
        self.next_seq += 1;
        self.loading = true;
        self.next_seq
    }

    pub fn apply_event(&mut self, event: Event) -> Applied {
        match event {
            Event::IssuesFetched {
                seq,
                issues,
                skipped,
            } => {
                let count = issues.len();
                if !self.store.replace_all(seq, issues) {
                    return Applied::Stale;
                }
                self.reapply_ledger();
                if seq >= self.next_seq {
                    self.loading = false;
                }
                self.last_error = None;
                self.last_updated = Some(Instant::now());
                if skipped > 0 {
                    self.notice = Some(format!("{skipped} malformed report(s) skipped"));
                }
                Applied::Refreshed { count, skipped }
            }
            Event::FetchError { context, message } => {
                tracing::warn!("dashboard: {context} failed: {message}");
                self.loading = false;
                let message = format!("{context}: {message}");
                self.last_error = Some(message.clone());
                Applied::Failed { message }
            }
            Event::StatusUpdated { id, status } => {
                self.in_flight.remove(&id);
                workflow::apply_confirmed_status(&mut self.store, &id, status);
                self.notice = Some(format!("Issue {id} is now {status}"));
                self.last_error = None;
                Applied::StatusConfirmed { id, status }
            }
            Event::MutationError {
                id,
                description,
                message,
            } => {
                self.in_flight.remove(&id);
                let message = format!("{description}: {message}");
                tracing::warn!("dashboard: {message}");
                self.last_error = Some(message.clone());
                Applied::Failed { message }
            }
        }
    }

    fn reapply_ledger(&mut self) {
        let store = &mut self.store;
        self.ledger.retain(|id, entry| {
            let Some(issue) = store.get(id) else {
                return false;
            };
            let placeholder = format!("{} team", issue.department);
            let reapply = issue.status == IssueStatus::Pending
                || issue.assigned_to == Assignee::Worker(placeholder);
            if !reapply {
                // The backend now names a worker of its own.
                return issue.assigned_to.name() == entry.worker_name;
            }
            store.update(id, |i| workflow::bind_worker(i, &entry.worker_name));
            true
        });
    }

    // -- Controllers --------------------------------------------------------

    /// Assign a roster worker. Local-only; recorded in the ledger so that a
    /// later refresh does not undo it.
    pub fn assign(
        &mut self,
        id: &IssueId,
        worker_id: WorkerId,
    ) -> Result<Assignment, WorkflowError> {
        let result = workflow::assign(&mut self.store, &self.roster, id, worker_id);
        match &result {
            Ok(a) => {
                self.roster.bump(worker_id);
                self.ledger.insert(
                    id.clone(),
                    LedgerEntry {
                        worker_id: a.worker_id,
                        worker_name: a.worker_name.clone(),
                    },
                );
                self.notice = Some(format!("Assigned issue {id} to {}", a.worker_name));
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    /// Validate a status change and mark it in flight. The caller sends the
    /// returned update to the engine; the store only moves once the backend
    /// acknowledges it.
    pub fn begin_status_update(
        &mut self,
        id: &IssueId,
        to: IssueStatus,
    ) -> Result<StatusUpdate, WorkflowError> {
        if self.in_flight.contains(id) {
            return Err(WorkflowError::UpdateInFlight(id.clone()));
        }
        match workflow::plan_status_update(&self.store, id, to) {
            Ok(update) => {
                self.in_flight.insert(id.clone());
                Ok(update)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_in_flight(&self, id: &IssueId) -> bool {
        self.in_flight.contains(id)
    }

    // -- Derived views ------------------------------------------------------

    /// Issues passing the current filter, in store order.
    pub fn visible(&self) -> Vec<Arc<Issue>> {
        filter_issues(&self.store.issues(), &self.filter)
    }

    /// Stats over the whole store, independent of the filter.
    pub fn stats(&self) -> Stats {
        Stats::compute(&self.store.issues())
    }

    pub fn performance(&self, department: Option<&str>) -> PerformanceReport {
        PerformanceReport::compute(&self.store.issues(), department)
    }

    // -- Filter -------------------------------------------------------------

    pub fn filter(&self) -> &IssueFilter {
        &self.filter
    }

    pub fn select_tile(&mut self, tile: StatTile) {
        self.filter.apply_tile(tile);
    }

    pub fn cycle_status_filter(&mut self) {
        self.filter.cycle_status();
    }

    pub fn cycle_priority_filter(&mut self) {
        self.filter.cycle_priority();
    }

    pub fn cycle_category_filter(&mut self) {
        self.filter.cycle_category();
    }

    pub fn clear_filters(&mut self) {
        self.filter = IssueFilter::default();
    }

    /// Apply a search-box query. Structured prefixes present in the query
    /// override their dimension; dimensions it does not mention keep the
    /// value set by tiles or cycling.
    pub fn set_query(&mut self, query: &str) {
        let parsed = parse_issue_query(query);
        if parsed.status != StatusFilter::All {
            self.filter.status = parsed.status;
        }
        if parsed.priority.is_some() {
            self.filter.priority = parsed.priority;
        }
        if parsed.category.is_some() {
            self.filter.category = parsed.category;
        }
        self.filter.search = parsed.search;
        self.filter.department = parsed.department;
        self.filter.worker = parsed.worker;
        self.filter.assignment = parsed.assignment;
        self.filter.has_location = parsed.has_location;
    }

    // -- Accessors ----------------------------------------------------------

    pub fn store(&self) -> &IssueStore {
        &self.store
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn issue(&self, id: &IssueId) -> Option<&Issue> {
        self.store.get(id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_messages(&mut self) {
        self.notice = None;
        self.last_error = None;
    }

    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(Roster::builtin())
    }
}
