use std::borrow::Borrow;

use serde::Serialize;

use crate::transform::lookup_category;
use crate::types::{Category, Issue, IssueStatus, Priority, StatusBucket};

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Status dimension of the filter: a wildcard, one exact status, or a stat
/// tile bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Is(IssueStatus),
    Bucket(StatusBucket),
}

impl StatusFilter {
    pub fn matches(self, status: IssueStatus) -> bool {
        match self {
            Self::All => true,
            Self::Is(s) => s == status,
            Self::Bucket(b) => status.bucket() == b,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Is(s) => s.label(),
            Self::Bucket(b) => b.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentFilter {
    Assigned,
    Unassigned,
}

/// Conjunction of every filter dimension. `None` means wildcard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    /// Free text, matched case-insensitively against title, description and
    /// location address.
    pub search: String,
    pub department: Option<String>,
    pub worker: Option<String>,
    pub assignment: Option<AssignmentFilter>,
    pub has_location: bool,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        if !self.status.matches(issue.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != issue.priority) {
            return false;
        }
        if self.category.is_some_and(|c| c != issue.category) {
            return false;
        }
        if let Some(dept) = &self.department
            && !issue.department.to_lowercase().contains(&dept.to_lowercase())
        {
            return false;
        }
        if let Some(worker) = &self.worker
            && !issue
                .assigned_to
                .name()
                .to_lowercase()
                .contains(&worker.to_lowercase())
        {
            return false;
        }
        match self.assignment {
            Some(AssignmentFilter::Assigned) if issue.assigned_to.is_unassigned() => return false,
            Some(AssignmentFilter::Unassigned) if !issue.assigned_to.is_unassigned() => {
                return false;
            }
            _ => {}
        }
        if self.has_location && issue.location.is_none() {
            return false;
        }
        matches_search(issue, &self.search)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply a stat tile: set the dimension the tile stands for and clear the
    /// other one.
    pub fn apply_tile(&mut self, tile: StatTile) {
        match tile {
            StatTile::Total => {
                self.status = StatusFilter::All;
                self.priority = None;
            }
            StatTile::HighPriority => {
                self.status = StatusFilter::All;
                self.priority = Some(Priority::High);
            }
            StatTile::Pending => {
                self.status = StatusFilter::Is(IssueStatus::Pending);
                self.priority = None;
            }
            StatTile::Active => {
                self.status = StatusFilter::Bucket(StatusBucket::Active);
                self.priority = None;
            }
            StatTile::AwaitingVerification => {
                self.status = StatusFilter::Bucket(StatusBucket::AwaitingVerification);
                self.priority = None;
            }
            StatTile::Verified => {
                self.status = StatusFilter::Is(IssueStatus::Verified);
                self.priority = None;
            }
        }
    }

    /// Cycle the exact-status dimension: All → each status in order → All.
    pub fn cycle_status(&mut self) {
        self.status = match self.status {
            StatusFilter::All | StatusFilter::Bucket(_) => StatusFilter::Is(IssueStatus::ALL[0]),
            StatusFilter::Is(s) => {
                let pos = IssueStatus::ALL.iter().position(|x| *x == s).unwrap_or(0);
                IssueStatus::ALL
                    .get(pos + 1)
                    .map_or(StatusFilter::All, |next| StatusFilter::Is(*next))
            }
        };
    }

    pub fn cycle_priority(&mut self) {
        self.priority = cycle_option(&Priority::ALL, self.priority);
    }

    pub fn cycle_category(&mut self) {
        self.category = cycle_option(&Category::ALL, self.category);
    }

    /// Short human-readable summary of the active dimensions, for the footer.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.status != StatusFilter::All {
            parts.push(format!("status: {}", self.status.label()));
        }
        if let Some(p) = self.priority {
            parts.push(format!("priority: {p}"));
        }
        if let Some(c) = self.category {
            parts.push(format!("category: {c}"));
        }
        if let Some(d) = &self.department {
            parts.push(format!("dept: {d}"));
        }
        if let Some(w) = &self.worker {
            parts.push(format!("worker: {w}"));
        }
        match self.assignment {
            Some(AssignmentFilter::Assigned) => parts.push("assigned".to_owned()),
            Some(AssignmentFilter::Unassigned) => parts.push("unassigned".to_owned()),
            None => {}
        }
        if self.has_location {
            parts.push("has location".to_owned());
        }
        if !self.search.is_empty() {
            parts.push(format!("\"{}\"", self.search));
        }
        parts.join(", ")
    }
}

fn cycle_option<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(c) => {
            let pos = all.iter().position(|x| *x == c)?;
            all.get(pos + 1).copied()
        }
    }
}

fn matches_search(issue: &Issue, search: &str) -> bool {
    let needle = search.trim();
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    issue.title.to_lowercase().contains(&needle)
        || issue.description.to_lowercase().contains(&needle)
        || issue
            .address()
            .is_some_and(|a| a.to_lowercase().contains(&needle))
}

/// Filter issues, preserving store order. Pure and idempotent: filtering an
/// already-filtered list with the same filter returns it unchanged.
pub fn filter_issues<I>(issues: &[I], filter: &IssueFilter) -> Vec<I>
where
    I: Borrow<Issue> + Clone,
{
    issues
        .iter()
        .filter(|i| filter.matches(<I as Borrow<Issue>>::borrow(*i)))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Structured query
// ---------------------------------------------------------------------------

/// Parse a query string into a filter.
///
/// Supported prefixes:
/// - `status:in_progress` (also `status:active`, `status:awaiting`)
/// - `priority:high`
/// - `category:garbage`
/// - `dept:sanitation`
/// - `worker:rajesh`
/// - `is:assigned` / `is:unassigned`
/// - `has:location`
///
/// Unrecognized values leave their dimension unconstrained. Everything else
/// becomes free text.
pub fn parse_issue_query(query: &str) -> IssueFilter {
    let mut filter = IssueFilter::default();
    let mut text_parts = Vec::new();

    for token in query.split_whitespace() {
        if let Some(val) = token.strip_prefix("status:") {
            filter.status = IssueStatus::from_label(val)
                .map(StatusFilter::Is)
                .or_else(|| StatusBucket::from_label(val).map(StatusFilter::Bucket))
                .unwrap_or_default();
        } else if let Some(val) = token.strip_prefix("priority:") {
            filter.priority = Priority::from_label(val);
        } else if let Some(val) = token.strip_prefix("category:") {
            filter.category = lookup_category(val);
        } else if let Some(val) = token.strip_prefix("dept:") {
            filter.department = non_empty(val);
        } else if let Some(val) = token.strip_prefix("worker:") {
            filter.worker = non_empty(val);
        } else if let Some(val) = token.strip_prefix("is:") {
            filter.assignment = match val.to_lowercase().as_str() {
                "assigned" => Some(AssignmentFilter::Assigned),
                "unassigned" => Some(AssignmentFilter::Unassigned),
                _ => None,
            };
        } else if let Some(val) = token.strip_prefix("has:") {
            filter.has_location = val.eq_ignore_ascii_case("location");
        } else {
            text_parts.push(token);
        }
    }

    filter.search = text_parts.join(" ");
    filter
}

fn non_empty(val: &str) -> Option<String> {
    let v = val.replace('_', " ");
    (!v.trim().is_empty()).then_some(v)
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub awaiting_verification: usize,
    pub verified: usize,
    pub high_priority: usize,
}

impl Stats {
    pub fn compute<I: Borrow<Issue>>(issues: &[I]) -> Self {
        let mut stats = Self::default();
        for issue in issues {
            let issue = <I as Borrow<Issue>>::borrow(issue);
            stats.total += 1;
            match issue.status.bucket() {
                StatusBucket::Pending => stats.pending += 1,
                StatusBucket::Active => stats.active += 1,
                StatusBucket::AwaitingVerification => stats.awaiting_verification += 1,
                StatusBucket::Verified => stats.verified += 1,
            }
            if issue.priority == Priority::High {
                stats.high_priority += 1;
            }
        }
        stats
    }
}

/// The six summary tiles above the issue table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatTile {
    Total,
    Pending,
    Active,
    AwaitingVerification,
    Verified,
    HighPriority,
}

impl StatTile {
    pub const ALL: [StatTile; 6] = [
        Self::Total,
        Self::Pending,
        Self::Active,
        Self::AwaitingVerification,
        Self::Verified,
        Self::HighPriority,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Total => "Total",
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::AwaitingVerification => "Awaiting Verification",
            Self::Verified => "Verified",
            Self::HighPriority => "High Priority",
        }
    }

    pub fn count(self, stats: &Stats) -> usize {
        match self {
            Self::Total => stats.total,
            Self::Pending => stats.pending,
            Self::Active => stats.active,
            Self::AwaitingVerification => stats.awaiting_verification,
            Self::Verified => stats.verified,
            Self::HighPriority => stats.high_priority,
        }
    }

    /// Whether this tile's filter is the one currently applied.
    pub fn is_selected(self, filter: &IssueFilter) -> bool {
        let mut probe = filter.clone();
        probe.apply_tile(self);
        probe == *filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform_report;
    use crate::types::{Location, RawReport};

    fn make_issue(id: i64, status: IssueStatus, priority: Priority, description: &str) -> Issue {
        let mut raw = RawReport::with_id(id);
        raw.description = Some(description.to_owned());
        let mut issue = transform_report(&raw);
        issue.status = status;
        issue.priority = priority;
        issue
    }

    fn sample() -> Vec<Issue> {
        vec![
            make_issue(1, IssueStatus::Pending, Priority::High, "Pothole on MG Road"),
            make_issue(2, IssueStatus::Verified, Priority::Low, "Streetlight fixed"),
            make_issue(3, IssueStatus::InProgress, Priority::High, "Garbage pile"),
            make_issue(4, IssueStatus::WorkCompleted, Priority::Medium, "Drain cleared"),
        ]
    }

    fn ids(issues: &[Issue]) -> Vec<String> {
        issues.iter().map(|i| i.id.to_string()).collect()
    }

    // --- filter_issues ---

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let issues = sample();
        let out = filter_issues(&issues, &IssueFilter::default());
        assert_eq!(ids(&out), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn pending_filter_and_stats() {
        let issues = vec![
            make_issue(1, IssueStatus::Pending, Priority::High, "a"),
            make_issue(2, IssueStatus::Verified, Priority::Low, "b"),
        ];
        let filter = IssueFilter {
            status: StatusFilter::Is(IssueStatus::Pending),
            ..IssueFilter::default()
        };
        assert_eq!(ids(&filter_issues(&issues, &filter)), vec!["1"]);
        let stats = Stats::compute(&issues);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.high_priority, 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let issues = sample();
        let filter = IssueFilter {
            priority: Some(Priority::High),
            search: "o".to_owned(),
            ..IssueFilter::default()
        };
        let once = filter_issues(&issues, &filter);
        let twice = filter_issues(&once, &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn search_is_case_insensitive_and_checks_address() {
        let mut issues = sample();
        issues[1].location = Some(Location {
            lat: 18.5,
            lng: 73.8,
            address: Some("Shivaji Nagar".to_owned()),
        });
        let by_text = IssueFilter {
            search: "POTHOLE".to_owned(),
            ..IssueFilter::default()
        };
        let by_address = IssueFilter {
            search: "shivaji".to_owned(),
            ..IssueFilter::default()
        };
        assert_eq!(ids(&filter_issues(&issues, &by_text)), vec!["1"]);
        assert_eq!(ids(&filter_issues(&issues, &by_address)), vec!["2"]);
    }

    #[test]
    fn bucket_filter_matches_all_active_statuses() {
        let mut issues = sample();
        issues.push(make_issue(5, IssueStatus::Rejected, Priority::Low, "x"));
        let filter = IssueFilter {
            status: StatusFilter::Bucket(StatusBucket::Active),
            ..IssueFilter::default()
        };
        assert_eq!(ids(&filter_issues(&issues, &filter)), vec!["3", "5"]);
    }

    // --- stats ---

    #[test]
    fn stats_buckets_sum_to_total() {
        let issues = sample();
        let s = Stats::compute(&issues);
        assert_eq!(s.total, issues.len());
        assert_eq!(s.pending + s.active + s.awaiting_verification + s.verified, s.total);
        assert_eq!(s.high_priority, 2);
    }

    // --- tiles ---

    #[test]
    fn tile_sets_one_dimension_and_clears_the_other() {
        let mut filter = IssueFilter {
            status: StatusFilter::Is(IssueStatus::Verified),
            ..IssueFilter::default()
        };
        filter.apply_tile(StatTile::HighPriority);
        assert_eq!(filter.status, StatusFilter::All);
        assert_eq!(filter.priority, Some(Priority::High));

        filter.apply_tile(StatTile::Pending);
        assert_eq!(filter.status, StatusFilter::Is(IssueStatus::Pending));
        assert_eq!(filter.priority, None);
        assert!(StatTile::Pending.is_selected(&filter));
        assert!(!StatTile::Total.is_selected(&filter));
    }

    #[test]
    fn cycle_status_wraps_to_all() {
        let mut filter = IssueFilter::default();
        for _ in 0..IssueStatus::ALL.len() {
            filter.cycle_status();
        }
        assert_eq!(filter.status, StatusFilter::Is(IssueStatus::Rejected));
        filter.cycle_status();
        assert_eq!(filter.status, StatusFilter::All);
    }

    // --- parse_issue_query ---

    #[test]
    fn parse_plain_text() {
        let f = parse_issue_query("broken pipe");
        assert_eq!(f.search, "broken pipe");
        assert_eq!(f.status, StatusFilter::All);
    }

    #[test]
    fn parse_structured_prefixes() {
        let f = parse_issue_query("status:in_progress priority:high category:garbage leak");
        assert_eq!(f.status, StatusFilter::Is(IssueStatus::InProgress));
        assert_eq!(f.priority, Some(Priority::High));
        assert_eq!(f.category, Some(Category::Waste));
        assert_eq!(f.search, "leak");
    }

    #[test]
    fn parse_bucket_and_flags() {
        let f = parse_issue_query("status:active is:unassigned has:location dept:public_works");
        assert_eq!(f.status, StatusFilter::Bucket(StatusBucket::Active));
        assert_eq!(f.assignment, Some(AssignmentFilter::Unassigned));
        assert!(f.has_location);
        assert_eq!(f.department.as_deref(), Some("public works"));
    }

    #[test]
    fn parse_unknown_values_are_unconstrained() {
        let f = parse_issue_query("status:sleeping priority:meh category:volcano");
        assert!(f.is_empty());
    }

    #[test]
    fn worker_filter_matches_substring() {
        let mut issues = sample();
        issues[2].assigned_to = crate::types::Assignee::Worker("Rajesh Kumar".to_owned());
        let f = parse_issue_query("worker:rajesh");
        assert_eq!(ids(&filter_issues(&issues, &f)), vec!["3"]);
    }
}
