use std::sync::mpsc::Sender;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::ReportsClient;
use crate::config::types::AppConfig;

use super::interface::{Engine, EngineHandle, Event, Request};
use super::refresh::RefreshScheduler;

/// The engine backed by the real reports REST API.
pub struct BackendEngine {
    config: AppConfig,
}

impl BackendEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl Engine for BackendEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let handle = EngineHandle::new(tx);
        let spawned = std::thread::Builder::new()
            .name("civic-engine".to_owned())
            .spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(self.run_loop(rx)),
                Err(e) => tracing::error!("engine: tokio runtime init failed: {e}"),
            });
        if let Err(e) = spawned {
            tracing::error!("engine: failed to spawn thread: {e}");
        }
        handle
    }
}

/// State the request handlers share.
struct EngineState {
    client: Option<ReportsClient>,
    client_error: Option<String>,
    scheduler: RefreshScheduler,
    /// Highest fetch sequence number seen from the UI. Engine-initiated
    /// fetches reuse it, so the UI accepts them as current.
    last_seq: u64,
}

impl BackendEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        let (client, client_error) = match ReportsClient::from_config(&self.config.backend) {
            Ok(c) => (Some(c), None),
            Err(e) => {
                tracing::error!("engine: cannot build reports client: {e}");
                (None, Some(e.to_string()))
            }
        };
        let interval_mins = u64::from(self.config.defaults.refetch_interval_minutes);
        let mut state = EngineState {
            client,
            client_error,
            scheduler: RefreshScheduler::new(Duration::from_secs(interval_mins * 60)),
            last_seq: 0,
        };

        let tick_dur = Duration::from_secs((interval_mins * 60).max(60));
        let mut refresh_tick = tokio::time::interval(tick_dur);
        // Consume the first immediate tick so refresh fires after one full interval.
        refresh_tick.tick().await;

        loop {
            tokio::select! {
                biased;
                maybe_req = rx.recv() => {
                    match maybe_req {
                        None | Some(Request::Shutdown) => {
                            tracing::debug!("engine: shutting down");
                            break;
                        }
                        Some(req) => handle_request(req, &mut state).await,
                    }
                }
                _ = refresh_tick.tick() => {
                    tick_refresh(&mut state).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request dispatch
// ---------------------------------------------------------------------------

async fn handle_request(req: Request, state: &mut EngineState) {
    match req {
        Request::FetchIssues { seq, reply_tx } => {
            tracing::debug!("engine: FetchIssues seq={seq}");
            state.last_seq = state.last_seq.max(seq);
            let Some(client) = client_or_report(state, &reply_tx, "FetchIssues") else {
                return;
            };
            match client.fetch_reports().await {
                Ok(payload) => {
                    state.scheduler.mark_fetched();
                    tracing::debug!(
                        "engine: sending IssuesFetched seq={seq} count={} skipped={}",
                        payload.issues.len(),
                        payload.skipped
                    );
                    let _ = reply_tx.send(Event::IssuesFetched {
                        seq,
                        issues: payload.issues,
                        skipped: payload.skipped,
                    });
                }
                Err(e) => {
                    tracing::warn!("engine: FetchIssues seq={seq} error: {e}");
                    let _ = reply_tx.send(Event::FetchError {
                        context: "Fetch reports".to_owned(),
                        message: e.user_message(),
                    });
                }
            }
        }

        Request::UpdateStatus { update, reply_tx } => {
            tracing::debug!(
                "engine: UpdateStatus {} {} -> {} ({})",
                update.id,
                update.from,
                update.to,
                update.code
            );
            let Some(client) = state.client.clone() else {
                let _ = reply_tx.send(Event::MutationError {
                    id: update.id,
                    description: "Update status".to_owned(),
                    message: state
                        .client_error
                        .clone()
                        .unwrap_or_else(|| "backend client unavailable".to_owned()),
                });
                return;
            };
            match client.update_status(&update.id, update.code).await {
                Ok(()) => {
                    let _ = reply_tx.send(Event::StatusUpdated {
                        id: update.id.clone(),
                        status: update.to,
                    });
                    // The store is refreshed from the backend after every
                    // acknowledged change.
                    refetch_after_mutation(state, &reply_tx).await;
                }
                Err(e) => {
                    tracing::warn!("engine: UpdateStatus {} error: {e}", update.id);
                    let _ = reply_tx.send(Event::MutationError {
                        description: format!("Update issue {} to {}", update.id, update.to),
                        id: update.id,
                        message: e.user_message(),
                    });
                }
            }
        }

        Request::RegisterRefresh { notify_tx } => {
            tracing::debug!("engine: RegisterRefresh");
            state.scheduler.register(notify_tx);
        }

        Request::Shutdown => unreachable!("handled at run_loop level"),
    }
}

async fn refetch_after_mutation(state: &mut EngineState, reply_tx: &Sender<Event>) {
    let Some(client) = state.client.clone() else {
        return;
    };
    let seq = state.last_seq;
    match client.fetch_reports().await {
        Ok(payload) => {
            state.scheduler.mark_fetched();
            tracing::debug!("engine: post-mutation IssuesFetched seq={seq}");
            let _ = reply_tx.send(Event::IssuesFetched {
                seq,
                issues: payload.issues,
                skipped: payload.skipped,
            });
        }
        Err(e) => {
            tracing::warn!("engine: post-mutation refetch error: {e}");
            let _ = reply_tx.send(Event::FetchError {
                context: "Refresh after update".to_owned(),
                message: e.user_message(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Background refresh
// ---------------------------------------------------------------------------

async fn tick_refresh(state: &mut EngineState) {
    if !state.scheduler.is_due() {
        return;
    }
    let Some(client) = state.client.clone() else {
        return;
    };
    let seq = state.last_seq;
    match client.fetch_reports().await {
        Ok(payload) => {
            state.scheduler.mark_fetched();
            tracing::debug!(
                "engine: refresh IssuesFetched seq={seq} count={}",
                payload.issues.len()
            );
            state.scheduler.broadcast(&Event::IssuesFetched {
                seq,
                issues: payload.issues,
                skipped: payload.skipped,
            });
        }
        Err(e) => {
            // Background failures stay quiet; the next tick retries.
            tracing::debug!("engine: refresh error: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The reports client, or a `FetchError` sent to the caller when it could
/// not be built.
fn client_or_report(
    state: &EngineState,
    reply_tx: &Sender<Event>,
    context: &str,
) -> Option<ReportsClient> {
    if let Some(c) = &state.client {
        return Some(c.clone());
    }
    let message = state
        .client_error
        .clone()
        .unwrap_or_else(|| "backend client unavailable".to_owned());
    tracing::debug!("engine: {context}: no client: {message}");
    let _ = reply_tx.send(Event::FetchError {
        context: context.to_owned(),
        message,
    });
    None
}
