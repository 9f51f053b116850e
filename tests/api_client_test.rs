use std::time::Duration;

use civic_board::api::{ApiError, ReportsClient};
use civic_board::config::types::AppConfig;
use civic_board::engine::{BackendEngine, Engine, Event, Request};
use civic_board::types::{IssueId, IssueStatus};
use civic_board::workflow::StatusUpdate;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture_json() -> serde_json::Value {
    serde_json::from_str(include_str!("fixtures/reports.json")).unwrap()
}

fn client(server: &MockServer) -> ReportsClient {
    ReportsClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetch_reports_accepts_the_data_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture_json()))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server).fetch_reports().await.unwrap();
    assert_eq!(payload.issues.len(), 3);
    assert_eq!(payload.skipped, 2);
}

#[tokio::test]
async fn fetch_reports_accepts_a_bare_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "R-7", "description": "Open manhole", "category": "drainage"}
        ])))
        .mount(&server)
        .await;

    let payload = client(&server).fetch_reports().await.unwrap();
    assert_eq!(payload.issues[0].id, IssueId::from("R-7"));
    assert_eq!(payload.issues[0].department, "Water & Drainage");
}

#[tokio::test]
async fn unexpected_shape_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reports": []})))
        .mount(&server)
        .await;

    let err = client(&server).fetch_reports().await.unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedShape(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_reports().await.unwrap_err();
    match &err {
        ApiError::Status { status, body } => {
            assert_eq!(*status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert!(err.user_message().contains("press r to retry"));
}

#[tokio::test]
async fn update_status_patches_the_backend_code() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/reports/102/status"))
        .and(body_json(json!({"status": "RESOLVED"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .update_status(&IssueId::from(102), "RESOLVED")
        .await
        .unwrap();
}

#[tokio::test]
async fn text_ids_are_path_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/reports/a%2Fb/status"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .update_status(&IssueId::from("a/b"), "VERIFIED")
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_report_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/reports/999/status"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server)
        .update_status(&IssueId::from(999), "VERIFIED")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("404: not found"));
}

// ---------------------------------------------------------------------------
// The engine against a mock backend
// ---------------------------------------------------------------------------

fn engine_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.backend.base_url = server.uri();
    config.backend.timeout_secs = 5;
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_update_confirms_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture_json()))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/reports/102/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let handle = BackendEngine::new(engine_config(&server)).start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    handle.send(Request::FetchIssues {
        seq: 4,
        reply_tx: tx.clone(),
    });
    handle.send(Request::UpdateStatus {
        update: StatusUpdate {
            id: IssueId::from(102),
            from: IssueStatus::InProgress,
            to: IssueStatus::WorkCompleted,
            code: "RESOLVED",
        },
        reply_tx: tx,
    });

    let events = tokio::task::spawn_blocking(move || {
        (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect::<Vec<_>>()
    })
    .await
    .unwrap();

    assert!(matches!(events[0], Event::IssuesFetched { seq: 4, .. }));
    assert!(matches!(
        events[1],
        Event::StatusUpdated {
            status: IssueStatus::WorkCompleted,
            ..
        }
    ));
    // The refetch reuses the latest sequence so the UI keeps it.
    assert!(matches!(events[2], Event::IssuesFetched { seq: 4, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_reports_fetch_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let handle = BackendEngine::new(engine_config(&server)).start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    handle.send(Request::FetchIssues { seq: 1, reply_tx: tx });

    let event = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();
    match event {
        Event::FetchError { context, message } => {
            assert_eq!(context, "Fetch reports");
            assert!(message.contains("500"));
        }
        other => panic!("expected FetchError, got {other:?}"),
    }
}
