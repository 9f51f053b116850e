use std::borrow::Borrow;
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{Issue, IssueStatus, Priority};

/// Number of months kept in the trend.
pub const TREND_MONTHS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentRow {
    pub department: String,
    pub total: usize,
    pub resolved: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Short label such as `Mar 24`.
    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map_or_else(|| format!("{}-{:02}", self.year, self.month), |d| {
                d.format("%b %y").to_string()
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub month: YearMonth,
    pub resolved: usize,
    pub open: usize,
}

/// Aggregate resolution metrics over a set of issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub department: Option<String>,
    pub total: usize,
    pub resolved: usize,
    /// `resolved / total`, `None` for an empty set.
    pub resolution_rate: Option<f64>,
    /// Mean days from report to resolution, over issues with both timestamps.
    pub avg_resolution_days: Option<f64>,
    pub pending: usize,
    pub high_priority_pending: usize,
    pub departments: Vec<DepartmentRow>,
    pub trend: Vec<TrendPoint>,
}

impl PerformanceReport {
    pub fn compute<I: Borrow<Issue>>(issues: &[I], department: Option<&str>) -> Self {
        let selected: Vec<&Issue> = issues
            .iter()
            .map(<I as Borrow<Issue>>::borrow)
            .filter(|i| department.is_none_or(|d| i.department.eq_ignore_ascii_case(d)))
            .collect();

        let total = selected.len();
        let resolved = selected.iter().filter(|i| i.status.is_resolved()).count();
        let pending = selected
            .iter()
            .filter(|i| i.status == IssueStatus::Pending)
            .count();
        let high_priority_pending = selected
            .iter()
            .filter(|i| i.status == IssueStatus::Pending && i.priority == Priority::High)
            .count();

        #[allow(clippy::cast_precision_loss)]
        let resolution_rate = (total > 0).then(|| resolved as f64 / total as f64);

        Self {
            department: department.map(str::to_owned),
            total,
            resolved,
            resolution_rate,
            avg_resolution_days: average_resolution_days(&selected),
            pending,
            high_priority_pending,
            departments: department_rows(&selected),
            trend: monthly_trend(&selected),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn average_resolution_days(issues: &[&Issue]) -> Option<f64> {
    let samples: Vec<f64> = issues
        .iter()
        .filter_map(|i| {
            let reported = i.reported_time()?;
            let resolved = i.resolved_time()?;
            let secs = (resolved - reported).num_seconds();
            (secs >= 0).then(|| secs as f64 / 86_400.0)
        })
        .collect();
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

fn department_rows(issues: &[&Issue]) -> Vec<DepartmentRow> {
    let mut rows: IndexMap<&str, DepartmentRow> = IndexMap::new();
    for issue in issues {
        let row = rows
            .entry(issue.department.as_str())
            .or_insert_with(|| DepartmentRow {
                department: issue.department.clone(),
                total: 0,
                resolved: 0,
                pending: 0,
            });
        row.total += 1;
        if issue.status.is_resolved() {
            row.resolved += 1;
        }
        if issue.status == IssueStatus::Pending {
            row.pending += 1;
        }
    }
    rows.into_values().collect()
}

fn monthly_trend(issues: &[&Issue]) -> Vec<TrendPoint> {
    let mut months: BTreeMap<YearMonth, TrendPoint> = BTreeMap::new();
    for issue in issues {
        let Some(reported) = issue.reported_time() else {
            continue;
        };
        let month = YearMonth {
            year: reported.year(),
            month: reported.month(),
        };
        let point = months.entry(month).or_insert(TrendPoint {
            month,
            resolved: 0,
            open: 0,
        });
        if issue.status.is_resolved() {
            point.resolved += 1;
        } else {
            point.open += 1;
        }
    }
    let skip = months.len().saturating_sub(TREND_MONTHS);
    months.into_values().skip(skip).collect()
}
