use std::sync::Arc;

use indexmap::IndexMap;

use crate::types::{Issue, IssueId};

/// In-memory issue collection, the single source of truth for the UI.
///
/// Issues are held behind `Arc` so that cloning the store (which the UI does
/// on every state update) is cheap, and so an in-place update replaces only
/// the targeted record: every other `Arc` stays pointer-identical.
#[derive(Debug, Clone, Default)]
pub struct IssueStore {
    issues: IndexMap<IssueId, Arc<Issue>>,
    /// Sequence number of the fetch currently displayed.
    applied_seq: Option<u64>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list, collapsing duplicate ids (a later record
    /// replaces the earlier one in place).
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let mut store = Self::new();
        store.load(issues);
        store
    }

    fn load(&mut self, issues: Vec<Issue>) {
        self.issues.clear();
        for issue in issues {
            let id = issue.id.clone();
            if let (pos, Some(_)) = self.issues.insert_full(id, Arc::new(issue)) {
                tracing::warn!("store: duplicate issue id at position {pos}, keeping the later record");
            }
        }
    }

    /// Replace the whole collection with the result of fetch `seq`.
    ///
    /// Returns `false` and leaves the store untouched when `seq` is older than
    /// the fetch already applied.
    pub fn replace_all(&mut self, seq: u64, issues: Vec<Issue>) -> bool {
        if self.applied_seq.is_some_and(|applied| seq < applied) {
            tracing::debug!(
                "store: dropping stale fetch seq={seq} (applied={:?})",
                self.applied_seq
            );
            return false;
        }
        self.load(issues);
        self.applied_seq = Some(seq);
        true
    }

    pub fn applied_seq(&self) -> Option<u64> {
        self.applied_seq
    }

    /// The issues in store order. Clones only the `Arc`s.
    pub fn issues(&self) -> Vec<Arc<Issue>> {
        self.issues.values().cloned().collect()
    }

    pub fn get(&self, id: &IssueId) -> Option<&Issue> {
        self.issues.get(id).map(|issue| &**issue)
    }

    pub fn contains(&self, id: &IssueId) -> bool {
        self.issues.contains_key(id)
    }

    /// Apply `f` to a copy of the issue and swap it in at the same position.
    pub fn update<F>(&mut self, id: &IssueId, f: F) -> Option<&Issue>
    where
        F: FnOnce(&mut Issue),
    {
        let slot = self.issues.get_mut(id)?;
        let mut next = Issue::clone(slot);
        f(&mut next);
        debug_assert_eq!(&next.id, id, "update must not change the id");
        *slot = Arc::new(next);
        Some(&**slot)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform_report;
    use crate::types::{IssueStatus, RawReport};

    fn issue(id: i64) -> Issue {
        transform_report(&RawReport::with_id(id))
    }

    #[test]
    fn duplicate_ids_collapse_in_place() {
        let mut second = issue(1);
        second.title = "second".to_owned();
        let store = IssueStore::from_issues(vec![issue(1), issue(2), second]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.issues()[0].title, "second");
    }

    #[test]
    fn update_leaves_other_records_pointer_identical() {
        let mut store = IssueStore::from_issues(vec![issue(1), issue(2), issue(3)]);
        let before: Vec<_> = store.issues().to_vec();
        store.update(&IssueId::Number(2), |i| i.status = IssueStatus::Assigned);
        assert!(Arc::ptr_eq(&before[0], &store.issues()[0]));
        assert!(!Arc::ptr_eq(&before[1], &store.issues()[1]));
        assert!(Arc::ptr_eq(&before[2], &store.issues()[2]));
        assert_eq!(store.issues()[1].status, IssueStatus::Assigned);
    }

    #[test]
    fn update_unknown_id_is_none() {
        let mut store = IssueStore::from_issues(vec![issue(1)]);
        assert!(store.update(&IssueId::Number(9), |_| {}).is_none());
    }

    #[test]
    fn stale_fetch_is_dropped() {
        let mut store = IssueStore::new();
        assert!(store.replace_all(2, vec![issue(1), issue(2)]));
        assert!(!store.replace_all(1, vec![issue(3)]));
        assert_eq!(store.len(), 2);
        assert!(store.replace_all(2, vec![issue(3)]));
        assert_eq!(store.len(), 1);
    }
}
