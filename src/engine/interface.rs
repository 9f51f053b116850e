use std::sync::mpsc::Sender;

use crate::types::{Issue, IssueId, IssueStatus};
use crate::workflow::StatusUpdate;

/// Handle to the backend engine held by the UI layer.
///
/// Cheaply cloneable. When the last handle is dropped the sender channel
/// closes, signalling the engine to shut down.
#[derive(Clone)]
pub struct EngineHandle {
    tx: tokio::sync::mpsc::UnboundedSender<Request>,
}

impl EngineHandle {
    pub(super) fn new(tx: tokio::sync::mpsc::UnboundedSender<Request>) -> Self {
        Self { tx }
    }

    /// Send a request to the engine. Non-blocking. Returns `false` when the
    /// engine has already shut down and the request was dropped.
    pub fn send(&self, req: Request) -> bool {
        self.tx.send(req).is_ok()
    }
}

/// Implemented by `BackendEngine` and `StubEngine`.
pub trait Engine: Send + 'static {
    fn start(self) -> EngineHandle;
}

/// Operations the UI layer can send to the engine.
pub enum Request {
    /// Fetch the full report list. `seq` is echoed back so the UI can drop
    /// responses older than the data it already shows.
    FetchIssues { seq: u64, reply_tx: Sender<Event> },

    /// Persist a locally validated status change, then refetch.
    UpdateStatus {
        update: StatusUpdate,
        reply_tx: Sender<Event>,
    },

    /// Subscribe to background refreshes of the full list.
    RegisterRefresh { notify_tx: Sender<Event> },

    Shutdown,
}

/// Events the engine pushes back to the UI.
#[derive(Debug, Clone)]
pub enum Event {
    IssuesFetched {
        seq: u64,
        issues: Vec<Issue>,
        /// Records dropped by the transform.
        skipped: usize,
    },
    /// A fetch failed; the UI keeps showing what it had.
    FetchError { context: String, message: String },

    /// The backend acknowledged a status change.
    StatusUpdated { id: IssueId, status: IssueStatus },
    MutationError {
        id: IssueId,
        description: String,
        message: String,
    },
}
