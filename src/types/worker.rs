use serde::{Deserialize, Serialize};

pub type WorkerId = u32;

/// A field worker from the static roster. `active_issues` is a display
/// counter only; nothing reconciles it with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub active_issues: u32,
}

impl Worker {
    pub fn new(id: WorkerId, name: &str, department: &str, active_issues: u32) -> Self {
        Self {
            id,
            name: name.to_owned(),
            department: department.to_owned(),
            active_issues,
        }
    }
}

/// The worker roster, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    workers: Vec<Worker>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Roster {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self { workers }
    }

    /// The roster shipped with the binary, used when the config names none.
    pub fn builtin() -> Self {
        Self::new(vec![
            Worker::new(1, "Rajesh Kumar", "Public Works", 3),
            Worker::new(2, "Priya Sharma", "Sanitation", 2),
            Worker::new(3, "Amit Patel", "Electrical", 4),
            Worker::new(4, "Sunita Deshmukh", "Water & Drainage", 1),
            Worker::new(5, "Vikram Singh", "Public Works", 2),
            Worker::new(6, "Anjali Joshi", "Horticulture", 0),
            Worker::new(7, "Mahesh Pawar", "Animal Control", 1),
            Worker::new(8, "Kavita Rao", "Town Planning", 2),
        ])
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn find(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Worker> {
        let lower = name.trim().to_lowercase();
        self.workers.iter().find(|w| w.name.to_lowercase() == lower)
    }

    /// Workers of `department`, or the whole roster when that department
    /// has nobody.
    pub fn for_department(&self, department: &str) -> Vec<&Worker> {
        let matching: Vec<&Worker> = self
            .workers
            .iter()
            .filter(|w| w.department.eq_ignore_ascii_case(department))
            .collect();
        if matching.is_empty() {
            self.workers.iter().collect()
        } else {
            matching
        }
    }

    pub(crate) fn bump(&mut self, id: WorkerId) {
        if let Some(w) = self.workers.iter_mut().find(|w| w.id == id) {
            w.active_issues = w.active_issues.saturating_add(1);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_department_filters_case_insensitively() {
        let roster = Roster::builtin();
        let names: Vec<_> = roster
            .for_department("public works")
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(names, vec!["Rajesh Kumar", "Vikram Singh"]);
    }

    #[test]
    fn for_department_falls_back_to_everyone() {
        let roster = Roster::builtin();
        assert_eq!(roster.for_department("General").len(), roster.workers().len());
    }

    #[test]
    fn bump_increments_only_target() {
        let mut roster = Roster::builtin();
        roster.bump(2);
        assert_eq!(roster.find(2).unwrap().active_issues, 3);
        assert_eq!(roster.find(1).unwrap().active_issues, 3);
    }

    #[test]
    fn find_by_name_ignores_case() {
        let roster = Roster::builtin();
        assert_eq!(roster.find_by_name("amit patel").map(|w| w.id), Some(3));
    }
}
