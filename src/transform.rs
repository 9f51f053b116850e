use serde_json::Value;

use crate::types::issue::normalize_key;
use crate::types::{
    Assignee, Category, Issue, IssueStatus, Location, Priority, RawReport, Reporter, WorkProof,
};

/// Longest derived title, in characters, before the ellipsis.
pub const TITLE_MAX_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

/// Map a backend category name onto a [`Category`]. Matching ignores case,
/// whitespace and punctuation, so `"Street Lights"`, `"street_lights"` and
/// `"STREETLIGHTS"` are the same key.
pub fn lookup_category(name: &str) -> Option<Category> {
    let key = normalize_key(name);
    let cat = match key.as_str() {
        "roads" | "road" | "roadstraffic" | "potholes" | "pothole" | "traffic" => Category::Roads,
        "garbage" | "waste" | "wastecleanliness" | "sanitation" | "cleanliness" => {
            Category::Waste
        }
        "streetlight" | "streetlights" | "streetlighting" => Category::StreetLighting,
        "strayanimals" | "animals" | "strayanimal" => Category::StrayAnimals,
        "illegalconstruction" | "encroachment" | "construction" => Category::IllegalConstruction,
        "drainage" | "water" | "waterlogging" | "drainagewaterlogging" | "waterdrainage"
        | "waterdrainageclogging" => Category::Drainage,
        "parks" | "park" | "publicspaces" | "parkspublicspaces" => Category::Parks,
        "electrical" | "electricity" | "electricalhazards" => Category::Electrical,
        "other" | "general" => Category::Other,
        _ => return None,
    };
    Some(cat)
}

/// Map a backend status code onto an [`IssueStatus`].
pub fn lookup_status(code: &str) -> Option<IssueStatus> {
    let status = match normalize_key(code).as_str() {
        "pending" | "submitted" | "open" | "new" => IssueStatus::Pending,
        "assigned" => IssueStatus::Assigned,
        "inprogress" | "ongoing" => IssueStatus::InProgress,
        "resolved" | "completed" | "workcompleted" => IssueStatus::WorkCompleted,
        "verified" | "closed" => IssueStatus::Verified,
        "rejected" => IssueStatus::Rejected,
        _ => return None,
    };
    Some(status)
}

/// Backend status code for a status, or `None` for `Assigned`, which the
/// backend has no code for.
pub fn backend_code(status: IssueStatus) -> Option<&'static str> {
    match status {
        IssueStatus::Pending => Some("PENDING"),
        IssueStatus::Assigned => None,
        IssueStatus::InProgress => Some("IN_PROGRESS"),
        IssueStatus::WorkCompleted => Some("RESOLVED"),
        IssueStatus::Verified => Some("VERIFIED"),
        IssueStatus::Rejected => Some("REJECTED"),
    }
}

// ---------------------------------------------------------------------------
// Record transform
// ---------------------------------------------------------------------------

/// Turn one backend record into a normalized [`Issue`]. Never fails: unknown
/// categories fall back to `Other`, unknown statuses to `Pending`, missing
/// text to safe placeholders.
pub fn transform_report(raw: &RawReport) -> Issue {
    let description = raw.description.clone().unwrap_or_default();
    let category = raw
        .category
        .as_deref()
        .and_then(lookup_category)
        .unwrap_or(Category::Other);
    let department = category.department().to_owned();
    let status = raw
        .status
        .as_deref()
        .and_then(lookup_status)
        .unwrap_or(IssueStatus::Pending);
    let priority = raw
        .priority
        .as_deref()
        .and_then(Priority::from_label)
        .unwrap_or_default();

    let location = match (raw.latitude, raw.longitude) {
        (Some(lat), Some(lng)) => Some(Location {
            lat,
            lng,
            address: raw.location_address.clone(),
        }),
        _ => None,
    };

    let reporter = match &raw.citizen {
        Some(c) => {
            let fallback = Reporter::default();
            Reporter {
                name: c.name.clone().unwrap_or(fallback.name),
                phone: c.phone.clone().unwrap_or(fallback.phone),
            }
        }
        None => Reporter::default(),
    };

    let assigned_to = if status == IssueStatus::Pending {
        Assignee::Unassigned
    } else {
        match raw.assigned_to.as_deref() {
            Some(name) if !name.eq_ignore_ascii_case("unassigned") => {
                Assignee::Worker(name.to_owned())
            }
            _ => Assignee::Worker(format!("{department} team")),
        }
    };

    let work_proof = if status.carries_work_proof() {
        raw.work_proof.as_ref().map(|wp| WorkProof {
            summary: wp.summary.clone().unwrap_or_default(),
            image_url: wp.image_url.clone(),
            submitted_by: wp
                .submitted_by
                .clone()
                .unwrap_or_else(|| assigned_to.name().to_owned()),
        })
    } else {
        None
    };

    let images = raw
        .images
        .unwrap_or_else(|| u32::from(raw.image_url.is_some()));

    Issue {
        id: raw.id.clone(),
        title: derive_title(raw.title.as_deref(), &description),
        description,
        category,
        department,
        priority,
        status,
        reported_at: raw.created_at.clone().unwrap_or_default(),
        resolved_at: raw.resolved_at.clone(),
        location,
        reporter,
        assigned_to,
        images,
        image_url: raw.image_url.clone(),
        work_proof,
    }
}

fn derive_title(explicit: Option<&str>, description: &str) -> String {
    if let Some(t) = explicit.filter(|t| !t.trim().is_empty()) {
        return t.to_owned();
    }
    if description.trim().is_empty() {
        return "Untitled report".to_owned();
    }
    if description.chars().count() > TITLE_MAX_CHARS {
        let head: String = description.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        description.to_owned()
    }
}

// ---------------------------------------------------------------------------
// Payload transform
// ---------------------------------------------------------------------------

/// Result of transforming a full list payload.
#[derive(Debug, Clone, Default)]
pub struct TransformedPayload {
    pub issues: Vec<Issue>,
    /// Records dropped because they were not objects or had no usable id.
    pub skipped: usize,
}

/// Error for payloads that are neither a list nor `{data: list}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a list of reports or {{\"data\": [...]}}, got {0}")]
pub struct UnexpectedShape(pub &'static str);

/// Validate the payload envelope and transform every record in it.
pub fn transform_payload(payload: Value) -> Result<TransformedPayload, UnexpectedShape> {
    let records = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => return Err(UnexpectedShape(json_kind(&other))),
            None => return Err(UnexpectedShape("an object without `data`")),
        },
        other => return Err(UnexpectedShape(json_kind(&other))),
    };

    let mut out = TransformedPayload::default();
    for (idx, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<RawReport>(record) {
            Ok(raw) => out.issues.push(transform_report(&raw)),
            Err(e) => {
                tracing::warn!("transform: skipping report #{idx}: {e}");
                out.skipped += 1;
            }
        }
    }
    Ok(out)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IssueId, RawCitizen, RawWorkProof};
    use serde_json::json;

    #[test]
    fn unknown_everything_gets_safe_defaults() {
        let mut raw = RawReport::with_id(5);
        raw.description = Some("x".repeat(80));
        raw.status = Some("UNKNOWN_CODE".to_owned());
        let issue = transform_report(&raw);
        assert_eq!(issue.id, IssueId::Number(5));
        assert_eq!(issue.title, format!("{}...", "x".repeat(50)));
        assert_eq!(issue.category, Category::Other);
        assert_eq!(issue.department, "General");
        assert_eq!(issue.status, IssueStatus::Pending);
        assert_eq!(issue.priority, Priority::Medium);
        assert!(issue.assigned_to.is_unassigned());
    }

    #[test]
    fn short_description_is_title_verbatim() {
        let mut raw = RawReport::with_id(1);
        raw.description = Some("Pothole near school".to_owned());
        assert_eq!(transform_report(&raw).title, "Pothole near school");
    }

    #[test]
    fn explicit_title_wins() {
        let mut raw = RawReport::with_id(1);
        raw.title = Some("Broken light".to_owned());
        raw.description = Some("x".repeat(80));
        assert_eq!(transform_report(&raw).title, "Broken light");
    }

    #[test]
    fn title_truncation_counts_chars_not_bytes() {
        let mut raw = RawReport::with_id(1);
        raw.description = Some("ड".repeat(60));
        let title = transform_report(&raw).title;
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
    }

    #[test]
    fn category_aliases_resolve() {
        assert_eq!(lookup_category("Garbage"), Some(Category::Waste));
        assert_eq!(lookup_category("Street Lights"), Some(Category::StreetLighting));
        assert_eq!(lookup_category("water-logging"), Some(Category::Drainage));
        assert_eq!(lookup_category("Electrical Hazards"), Some(Category::Electrical));
        assert_eq!(lookup_category("Potholes"), Some(Category::Roads));
        assert_eq!(lookup_category("volcano"), None);
    }

    #[test]
    fn status_codes_resolve() {
        assert_eq!(lookup_status("SUBMITTED"), Some(IssueStatus::Pending));
        assert_eq!(lookup_status("IN_PROGRESS"), Some(IssueStatus::InProgress));
        assert_eq!(lookup_status("RESOLVED"), Some(IssueStatus::WorkCompleted));
        assert_eq!(lookup_status("Work Completed"), Some(IssueStatus::WorkCompleted));
    }

    #[test]
    fn backend_codes_round_trip_except_assigned() {
        for status in IssueStatus::ALL {
            match backend_code(status) {
                Some(code) => assert_eq!(lookup_status(code), Some(status)),
                None => assert_eq!(status, IssueStatus::Assigned),
            }
        }
    }

    #[test]
    fn location_requires_both_coordinates() {
        let mut raw = RawReport::with_id(1);
        raw.latitude = Some(18.5);
        raw.location_address = Some("FC Road".to_owned());
        assert!(transform_report(&raw).location.is_none());

        raw.longitude = Some(73.8);
        let loc = transform_report(&raw).location.unwrap();
        assert_eq!(loc.address.as_deref(), Some("FC Road"));
    }

    #[test]
    fn pending_is_always_unassigned() {
        let mut raw = RawReport::with_id(1);
        raw.status = Some("PENDING".to_owned());
        raw.assigned_to = Some("Rajesh Kumar".to_owned());
        assert!(transform_report(&raw).assigned_to.is_unassigned());
    }

    #[test]
    fn non_pending_without_worker_gets_department_team() {
        let mut raw = RawReport::with_id(1);
        raw.status = Some("IN_PROGRESS".to_owned());
        raw.category = Some("Garbage".to_owned());
        assert_eq!(
            transform_report(&raw).assigned_to,
            Assignee::Worker("Sanitation team".to_owned())
        );
    }

    #[test]
    fn work_proof_dropped_before_completion() {
        let mut raw = RawReport::with_id(1);
        raw.status = Some("IN_PROGRESS".to_owned());
        raw.work_proof = Some(RawWorkProof {
            summary: Some("filled".to_owned()),
            ..RawWorkProof::default()
        });
        assert!(transform_report(&raw).work_proof.is_none());

        raw.status = Some("RESOLVED".to_owned());
        raw.assigned_to = Some("Rajesh Kumar".to_owned());
        let proof = transform_report(&raw).work_proof.unwrap();
        assert_eq!(proof.summary, "filled");
        assert_eq!(proof.submitted_by, "Rajesh Kumar");
    }

    #[test]
    fn reporter_defaults_fill_gaps() {
        let mut raw = RawReport::with_id(1);
        raw.citizen = Some(RawCitizen {
            name: Some("Meera".to_owned()),
            phone: None,
        });
        let issue = transform_report(&raw);
        assert_eq!(issue.reporter.name, "Meera");
        assert_eq!(issue.reporter.phone, "N/A");
        assert_eq!(transform_report(&RawReport::with_id(2)).reporter, Reporter::default());
    }

    #[test]
    fn payload_accepts_bare_array_and_data_envelope() {
        let bare = transform_payload(json!([{"id": 1}, {"id": 2}])).unwrap();
        let wrapped = transform_payload(json!({"data": [{"id": 1}]})).unwrap();
        assert_eq!(bare.issues.len(), 2);
        assert_eq!(wrapped.issues.len(), 1);
    }

    #[test]
    fn payload_skips_bad_records() {
        let out = transform_payload(json!([{"id": 1}, "junk", {"description": "no id"}])).unwrap();
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.skipped, 2);
    }

    #[test]
    fn payload_rejects_other_shapes() {
        assert!(transform_payload(json!({"reports": []})).is_err());
        assert!(transform_payload(json!({"data": {"id": 1}})).is_err());
        assert!(transform_payload(json!("nope")).is_err());
    }
}
