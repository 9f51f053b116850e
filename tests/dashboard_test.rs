use civic_board::dashboard::{Applied, Dashboard};
use civic_board::engine::Event;
use civic_board::filter::StatTile;
use civic_board::transform::transform_payload;
use civic_board::types::{Issue, IssueId, IssueStatus, Priority, Roster};
use civic_board::workflow::WorkflowError;

fn fixture() -> (Vec<Issue>, usize) {
    let json = include_str!("fixtures/reports.json");
    let payload: serde_json::Value = serde_json::from_str(json).unwrap();
    let out = transform_payload(payload).unwrap();
    (out.issues, out.skipped)
}

fn loaded() -> Dashboard {
    Dashboard::with_issues(Roster::builtin(), fixture().0)
}

fn fetched(seq: u64, issues: Vec<Issue>) -> Event {
    Event::IssuesFetched {
        seq,
        issues,
        skipped: 0,
    }
}

#[test]
fn fixture_transform_skips_bad_records() {
    let (issues, skipped) = fixture();
    assert_eq!(issues.len(), 3);
    assert_eq!(skipped, 2);
    let pothole = &issues[0];
    assert_eq!(pothole.department, "Public Works");
    assert_eq!(pothole.priority, Priority::High);
    assert!(pothole.assigned_to.is_unassigned());
    assert_eq!(pothole.reporter.name, "Meera Iyer");
    assert_eq!(pothole.address(), Some("FC Road"));
    // No title on the wire: derived from the description.
    assert_eq!(issues[1].title, "Garbage not collected for a week");
    assert_eq!(issues[2].status, IssueStatus::WorkCompleted);
    assert!(issues[2].work_proof.is_some());
}

#[test]
fn skipped_records_raise_a_notice() {
    let mut d = Dashboard::new(Roster::builtin());
    let seq = d.begin_fetch();
    assert!(d.is_loading());
    let applied = d.apply_event(Event::IssuesFetched {
        seq,
        issues: fixture().0,
        skipped: 2,
    });
    assert_eq!(applied, Applied::Refreshed { count: 3, skipped: 2 });
    assert!(!d.is_loading());
    assert!(d.notice().is_some_and(|n| n.contains("2 malformed")));
}

#[test]
fn older_fetch_is_dropped() {
    let mut d = Dashboard::new(Roster::builtin());
    let first = d.begin_fetch();
    let second = d.begin_fetch();
    let (issues, _) = fixture();

    assert!(matches!(
        d.apply_event(fetched(second, issues.clone())),
        Applied::Refreshed { .. }
    ));
    assert_eq!(d.apply_event(fetched(first, Vec::new())), Applied::Stale);
    assert_eq!(d.store().len(), 3);
}

#[test]
fn fetch_error_keeps_the_data() {
    let mut d = loaded();
    d.begin_fetch();
    let applied = d.apply_event(Event::FetchError {
        context: "Fetch reports".to_owned(),
        message: "backend returned 503".to_owned(),
    });
    assert!(matches!(applied, Applied::Failed { .. }));
    assert_eq!(d.store().len(), 3);
    assert_eq!(d.last_error(), Some("Fetch reports: backend returned 503"));
    assert!(!d.is_loading());
}

#[test]
fn local_assignment_survives_refresh() {
    let mut d = loaded();
    let id = IssueId::from(101);
    let a = d.assign(&id, 5).unwrap();
    assert_eq!(a.worker_name, "Vikram Singh");
    assert_eq!(a.status, IssueStatus::Assigned);
    assert_eq!(d.roster().find(5).unwrap().active_issues, 3);

    // The backend still reports the issue as pending and unassigned.
    let seq = d.begin_fetch();
    d.apply_event(fetched(seq, fixture().0));
    let issue = d.issue(&id).unwrap();
    assert_eq!(issue.status, IssueStatus::Assigned);
    assert_eq!(issue.assigned_to.name(), "Vikram Singh");
}

#[test]
fn assignment_refused_only_once_verified() {
    let mut issues = fixture().0;
    issues[1].status = IssueStatus::Rejected;
    issues[2].status = IssueStatus::Verified;
    let mut d = Dashboard::with_issues(Roster::builtin(), issues);

    let err = d.assign(&IssueId::from(103), 3).unwrap_err();
    assert!(matches!(err, WorkflowError::AssignmentClosed(_, IssueStatus::Verified)));
    assert!(d.last_error().is_some());

    let a = d.assign(&IssueId::from(102), 3).unwrap();
    assert_eq!(a.status, IssueStatus::Rejected);
    assert_eq!(d.issue(&IssueId::from(102)).unwrap().assigned_to.name(), a.worker_name);
}

#[test]
fn illegal_transition_is_rejected_locally() {
    let mut d = loaded();
    let id = IssueId::from(101);
    assert!(matches!(
        d.begin_status_update(&id, IssueStatus::Verified),
        Err(WorkflowError::IllegalTransition { .. })
    ));
    assert!(matches!(
        d.begin_status_update(&id, IssueStatus::Assigned),
        Err(WorkflowError::NotPersistable(IssueStatus::Assigned))
    ));
    assert!(!d.is_in_flight(&id));
}

#[test]
fn second_update_waits_for_the_first() {
    let mut d = loaded();
    let id = IssueId::from(103);
    d.begin_status_update(&id, IssueStatus::Verified).unwrap();
    assert!(matches!(
        d.begin_status_update(&id, IssueStatus::Rejected),
        Err(WorkflowError::UpdateInFlight(_))
    ));
}

#[test]
fn tiles_and_queries_combine() {
    let mut d = loaded();
    d.select_tile(StatTile::HighPriority);
    assert_eq!(d.visible().len(), 1);

    // A plain-text query narrows within the tile.
    d.set_query("garbage");
    assert!(d.visible().is_empty());

    d.clear_filters();
    d.set_query("category:garbage");
    let visible = d.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, IssueId::from(102));

    d.clear_filters();
    d.set_query("has:location");
    assert_eq!(d.visible().len(), 2);
}

#[test]
fn stats_ignore_the_filter() {
    let mut d = loaded();
    d.select_tile(StatTile::Pending);
    assert_eq!(d.visible().len(), 1);
    let stats = d.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.high_priority, 1);
}

#[test]
fn performance_per_department() {
    let d = loaded();
    let all = d.performance(None);
    assert_eq!(all.total, 3);
    assert_eq!(all.resolved, 1);
    assert_eq!(all.departments.len(), 3);

    let electrical = d.performance(Some("Electrical"));
    assert_eq!(electrical.total, 1);
    assert!((electrical.resolution_rate.unwrap() - 1.0).abs() < f64::EPSILON);
    assert!((electrical.avg_resolution_days.unwrap() - 3.0).abs() < 1e-9);
}

#[test]
fn string_and_number_ids_are_one_issue() {
    let payload = serde_json::json!([
        {"id": 5, "description": "first", "status": "PENDING"},
        {"id": "5", "description": "second", "status": "IN_PROGRESS"},
    ]);
    let out = transform_payload(payload).unwrap();
    let d = Dashboard::with_issues(Roster::builtin(), out.issues);
    assert_eq!(d.store().len(), 1);
    assert_eq!(d.issue(&IssueId::Number(5)).unwrap().description, "second");
}

#[test]
fn typed_id_finds_a_string_id_from_the_backend() {
    let payload = serde_json::json!([{"id": "5", "status": "IN_PROGRESS"}]);
    let out = transform_payload(payload).unwrap();
    let mut d = Dashboard::with_issues(Roster::builtin(), out.issues);
    let update = d
        .begin_status_update(&IssueId::parse("5"), IssueStatus::WorkCompleted)
        .unwrap();
    assert_eq!(update.code, "RESOLVED");
    assert!(d.is_in_flight(&IssueId::parse("#5")));
}
