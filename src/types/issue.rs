use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Backend-assigned report identifier. The backend hands out either integers
/// or opaque strings. A string holding a canonical integer (`"5"`, not
/// `"05"`) is the same id as that integer and is stored as `Number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueId {
    Number(i64),
    Text(String),
}

impl IssueId {
    /// Parse a user-typed id, accepting a leading `#`.
    pub fn parse(s: &str) -> Self {
        Self::from(s.trim().trim_start_matches('#'))
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for IssueId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Self::Number(n),
            _ => Self::Text(s.to_owned()),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueStatus {
    Pending,
    Assigned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Work Completed")]
    WorkCompleted,
    Verified,
    Rejected,
}

/// Aggregation bucket for the stat tiles. Every status lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Pending,
    Active,
    AwaitingVerification,
    Verified,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 6] = [
        Self::Pending,
        Self::Assigned,
        Self::InProgress,
        Self::WorkCompleted,
        Self::Verified,
        Self::Rejected,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::WorkCompleted => "Work Completed",
            Self::Verified => "Verified",
            Self::Rejected => "Rejected",
        }
    }

    /// Parse a display label, case- and separator-insensitive
    /// (`"in progress"`, `"in_progress"`, `"InProgress"` all work).
    pub fn from_label(s: &str) -> Option<Self> {
        match normalize_key(s).as_str() {
            "pending" => Some(Self::Pending),
            "assigned" => Some(Self::Assigned),
            "inprogress" => Some(Self::InProgress),
            "workcompleted" | "completed" => Some(Self::WorkCompleted),
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn bucket(self) -> StatusBucket {
        match self {
            Self::Pending => StatusBucket::Pending,
            Self::Assigned | Self::InProgress | Self::Rejected => StatusBucket::Active,
            Self::WorkCompleted => StatusBucket::AwaitingVerification,
            Self::Verified => StatusBucket::Verified,
        }
    }

    /// Whether a `work_proof` may be attached at this status.
    pub fn carries_work_proof(self) -> bool {
        matches!(
            self,
            Self::WorkCompleted | Self::Verified | Self::Rejected
        )
    }

    /// Counted as resolved by the performance report.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::WorkCompleted | Self::Verified)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl StatusBucket {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::AwaitingVerification => "Awaiting Verification",
            Self::Verified => "Verified",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match normalize_key(s).as_str() {
            "active" | "open" => Some(Self::Active),
            "awaitingverification" | "awaiting" | "review" => Some(Self::AwaitingVerification),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match normalize_key(s).as_str() {
            "high" | "urgent" | "critical" => Some(Self::High),
            "medium" | "normal" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Roads & Traffic")]
    Roads,
    #[serde(rename = "Waste & Cleanliness")]
    Waste,
    #[serde(rename = "Street Lighting")]
    StreetLighting,
    #[serde(rename = "Stray Animals")]
    StrayAnimals,
    #[serde(rename = "Illegal Construction")]
    IllegalConstruction,
    #[serde(rename = "Drainage & Water Logging")]
    Drainage,
    #[serde(rename = "Parks & Public Spaces")]
    Parks,
    #[serde(rename = "Electrical Hazards")]
    Electrical,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Roads,
        Self::Waste,
        Self::StreetLighting,
        Self::StrayAnimals,
        Self::IllegalConstruction,
        Self::Drainage,
        Self::Parks,
        Self::Electrical,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Roads => "Roads & Traffic",
            Self::Waste => "Waste & Cleanliness",
            Self::StreetLighting => "Street Lighting",
            Self::StrayAnimals => "Stray Animals",
            Self::IllegalConstruction => "Illegal Construction",
            Self::Drainage => "Drainage & Water Logging",
            Self::Parks => "Parks & Public Spaces",
            Self::Electrical => "Electrical Hazards",
            Self::Other => "Other",
        }
    }

    /// Municipal department responsible for this category.
    pub fn department(self) -> &'static str {
        match self {
            Self::Roads => "Public Works",
            Self::Waste => "Sanitation",
            Self::StreetLighting | Self::Electrical => "Electrical",
            Self::StrayAnimals => "Animal Control",
            Self::IllegalConstruction => "Town Planning",
            Self::Drainage => "Water & Drainage",
            Self::Parks => "Horticulture",
            Self::Other => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Supporting structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    pub name: String,
    pub phone: String,
}

impl Default for Reporter {
    fn default() -> Self {
        Self {
            name: "Anonymous".to_owned(),
            phone: "N/A".to_owned(),
        }
    }
}

/// Who an issue is assigned to. Serialized as the worker name or the
/// literal `"Unassigned"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Assignee {
    #[default]
    Unassigned,
    Worker(String),
}

pub const UNASSIGNED: &str = "Unassigned";

impl Assignee {
    pub fn name(&self) -> &str {
        match self {
            Self::Unassigned => UNASSIGNED,
            Self::Worker(name) => name,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Self::Unassigned)
    }
}

impl From<String> for Assignee {
    fn from(s: String) -> Self {
        if s.trim().is_empty() || s == UNASSIGNED {
            Self::Unassigned
        } else {
            Self::Worker(s)
        }
    }
}

impl From<Assignee> for String {
    fn from(a: Assignee) -> Self {
        match a {
            Assignee::Unassigned => UNASSIGNED.to_owned(),
            Assignee::Worker(name) => name,
        }
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkProof {
    pub summary: String,
    pub image_url: Option<String>,
    pub submitted_by: String,
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub department: String,
    pub priority: Priority,
    pub status: IssueStatus,
    /// Creation timestamp exactly as the backend sent it.
    pub reported_at: String,
    pub resolved_at: Option<String>,
    pub location: Option<Location>,
    pub reporter: Reporter,
    pub assigned_to: Assignee,
    pub images: u32,
    pub image_url: Option<String>,
    pub work_proof: Option<WorkProof>,
}

impl Issue {
    pub fn reported_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.reported_at)
    }

    pub fn resolved_time(&self) -> Option<DateTime<Utc>> {
        self.resolved_at.as_deref().and_then(parse_timestamp)
    }

    pub fn address(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.address.as_deref())
    }
}

/// Parse the timestamp shapes the backend is known to emit: RFC 3339,
/// naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`, or a bare date.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Lowercase and drop everything but ASCII alphanumerics.
pub(crate) fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
