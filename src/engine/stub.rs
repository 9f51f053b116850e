use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::{Issue, IssueId};
use crate::workflow;

use super::interface::{Engine, EngineHandle, Event, Request};

/// An engine that serves fixture data without any network calls.
///
/// Status updates are acknowledged and applied to the in-memory fixture, so a
/// follow-up fetch reflects them the way the real backend would. Ids listed
/// in `fail_updates_for` get a `MutationError` instead.
#[derive(Default)]
pub struct StubEngine {
    pub issues: Vec<Issue>,
    pub fail_updates_for: HashSet<IssueId>,
}

impl StubEngine {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self {
            issues,
            fail_updates_for: HashSet::new(),
        }
    }
}

impl Engine for StubEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        std::thread::spawn(move || match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(self.run_loop(rx)),
            Err(e) => tracing::error!("stub engine: tokio runtime init failed: {e}"),
        });
        EngineHandle::new(tx)
    }
}

impl StubEngine {
    async fn run_loop(mut self, mut rx: UnboundedReceiver<Request>) {
        let mut last_seq = 0;
        while let Some(req) = rx.recv().await {
            match req {
                Request::FetchIssues { seq, reply_tx } => {
                    last_seq = last_seq.max(seq);
                    let _ = reply_tx.send(Event::IssuesFetched {
                        seq,
                        issues: self.issues.clone(),
                        skipped: 0,
                    });
                }
                Request::UpdateStatus { update, reply_tx } => {
                    if self.fail_updates_for.contains(&update.id) {
                        let _ = reply_tx.send(Event::MutationError {
                            description: format!("Update issue {}", update.id),
                            id: update.id,
                            message: "stub failure".to_owned(),
                        });
                        continue;
                    }
                    if let Some(issue) = self.issues.iter_mut().find(|i| i.id == update.id) {
                        workflow::set_confirmed_status(issue, update.to);
                    }
                    let _ = reply_tx.send(Event::StatusUpdated {
                        id: update.id,
                        status: update.to,
                    });
                    let _ = reply_tx.send(Event::IssuesFetched {
                        seq: last_seq,
                        issues: self.issues.clone(),
                        skipped: 0,
                    });
                }

                // Refresh registration is ignored by the stub.
                Request::RegisterRefresh { .. } => {}

                Request::Shutdown => break,
            }
        }
    }
}
