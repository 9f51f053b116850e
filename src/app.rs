use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::config::keybindings::MergedBindings;
use crate::config::types::{AppConfig, View as DefaultView};
use crate::dashboard::{Applied, Dashboard};
use crate::engine::{EngineHandle, Event, Request};
use crate::theme::ResolvedTheme;
use crate::types::IssueId;
use crate::views::issues::IssuesView;
use crate::views::map::MapView;
use crate::views::performance::PerformanceView;
use crate::workflow::StatusUpdate;

// ---------------------------------------------------------------------------
// View kind enum (public for the footer)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Issues,
    Map,
    Performance,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Issues, ViewKind::Map, ViewKind::Performance];

    pub fn label(self) -> &'static str {
        match self {
            Self::Issues => "Issues",
            Self::Map => "Map",
            Self::Performance => "Performance",
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Issues => Self::Map,
            Self::Map => Self::Performance,
            Self::Performance => Self::Issues,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            Self::Issues => Self::Performance,
            Self::Map => Self::Issues,
            Self::Performance => Self::Map,
        }
    }
}

impl From<DefaultView> for ViewKind {
    fn from(view: DefaultView) -> Self {
        match view {
            DefaultView::Issues => Self::Issues,
            DefaultView::Map => Self::Map,
            DefaultView::Performance => Self::Performance,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine bus: what views use to reach the backend
// ---------------------------------------------------------------------------

/// The engine handle paired with the reply channel the app drains.
#[derive(Clone)]
pub struct Bus {
    engine: EngineHandle,
    reply_tx: Sender<Event>,
}

impl Bus {
    pub fn new(engine: EngineHandle, reply_tx: Sender<Event>) -> Self {
        Self { engine, reply_tx }
    }

    /// Start a full-list fetch and mark the dashboard as loading.
    pub fn refresh(&self, dashboard: &mut Dashboard) {
        let seq = dashboard.begin_fetch();
        tracing::debug!("app: fetch #{seq}");
        self.engine.send(Request::FetchIssues {
            seq,
            reply_tx: self.reply_tx.clone(),
        });
    }

    /// Hand a validated update to the engine. `false` means the engine is
    /// gone and no reply will ever arrive.
    pub fn update_status(&self, update: StatusUpdate) -> bool {
        self.engine.send(Request::UpdateStatus {
            update,
            reply_tx: self.reply_tx.clone(),
        })
    }

    fn register_refresh(&self) {
        self.engine.send(Request::RegisterRefresh {
            notify_tx: self.reply_tx.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// Root App component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct AppProps<'a> {
    pub config: Option<&'a AppConfig>,
    pub engine: Option<&'a EngineHandle>,
    pub theme: Option<&'a ResolvedTheme>,
    pub keybindings: Option<&'a MergedBindings>,
    pub color_depth: ColorDepth,
}

#[component]
pub fn App<'a>(props: &AppProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let (width, height) = hooks.use_terminal_size();
    let mut system = hooks.use_context_mut::<SystemContext>();
    let should_exit = hooks.use_state(|| false);

    let config = props.config;
    let theme = props.theme;
    let keybindings = props.keybindings;
    let depth = props.color_depth;

    let roster = config.map(AppConfig::roster).unwrap_or_default();
    let mut dashboard = hooks.use_state(move || Dashboard::new(roster));

    let initial_view = config.map_or(ViewKind::Issues, |c| c.defaults.view.into());
    let mut active_view = hooks.use_state(move || initial_view);

    // Signals set by child views.
    let mut switch_signal = hooks.use_state(|| false);
    if switch_signal.get() {
        switch_signal.set(false);
        active_view.set(active_view.get().next());
    }
    let mut switch_back_signal = hooks.use_state(|| false);
    if switch_back_signal.get() {
        switch_back_signal.set(false);
        active_view.set(active_view.get().prev());
    }
    // Set by the map when a marker is activated; the issues view consumes it.
    let focus_issue = hooks.use_state(|| Option::<IssueId>::None);
    if focus_issue.read().is_some() && active_view.get() != ViewKind::Issues {
        active_view.set(ViewKind::Issues);
    }

    if should_exit.get() {
        system.exit();
    }

    // Event channel: the engine pushes replies and refreshes here.
    let event_channel = hooks.use_state(|| {
        let (tx, rx) = std::sync::mpsc::channel::<Event>();
        (tx, Arc::new(Mutex::new(rx)))
    });
    let (event_tx, event_rx) = event_channel.read().clone();
    let bus = props.engine.map(|e| Bus::new(e.clone(), event_tx));

    // Subscribe to background refresh and fetch once at mount.
    let mut bootstrapped = hooks.use_state(|| false);
    if !bootstrapped.get()
        && let Some(bus) = &bus
    {
        bootstrapped.set(true);
        bus.register_refresh();
        bus.refresh(&mut *dashboard.write());
    }

    hooks.use_future(async move {
        loop {
            smol::Timer::after(std::time::Duration::from_millis(100)).await;
            let events: Vec<Event> = match event_rx.lock() {
                Ok(rx) => rx.try_iter().collect(),
                Err(_) => break,
            };
            for evt in events {
                match dashboard.write().apply_event(evt) {
                    Applied::Refreshed { count, skipped } => {
                        tracing::debug!("app: {count} issues loaded ({skipped} skipped)");
                    }
                    Applied::Stale => tracing::debug!("app: dropped stale response"),
                    Applied::StatusConfirmed { id, status } => {
                        tracing::debug!("app: issue {id} confirmed as {status}");
                    }
                    Applied::Failed { message } => tracing::debug!("app: {message}"),
                }
            }
        }
    });

    let active = active_view.get();
    let preview_width_pct = config.map_or(0.4, |c| c.defaults.preview.width);
    let date_format = config.map(|c| c.defaults.date_format.as_str());
    let backend = config.map(|c| &c.backend);
    let heatmap_default = config.is_some_and(|c| c.defaults.heatmap);

    element! {
        View(width: u32::from(width), height: u32::from(height), flex_direction: FlexDirection::Column) {
            View(
                display: if active == ViewKind::Issues { Display::Flex } else { Display::None },
                flex_grow: 1.0,
            ) {
                IssuesView(
                    dashboard,
                    bus: bus.clone(),
                    backend,
                    theme,
                    keybindings,
                    color_depth: depth,
                    width,
                    height,
                    preview_width_pct,
                    should_exit,
                    switch_view: switch_signal,
                    switch_view_back: switch_back_signal,
                    focus_issue,
                    date_format,
                    is_active: active == ViewKind::Issues,
                )
            }
            View(
                display: if active == ViewKind::Map { Display::Flex } else { Display::None },
                flex_grow: 1.0,
            ) {
                MapView(
                    dashboard,
                    bus: bus.clone(),
                    backend,
                    theme,
                    keybindings,
                    color_depth: depth,
                    width,
                    height,
                    heatmap: heatmap_default,
                    should_exit,
                    switch_view: switch_signal,
                    switch_view_back: switch_back_signal,
                    focus_issue,
                    is_active: active == ViewKind::Map,
                )
            }
            View(
                display: if active == ViewKind::Performance { Display::Flex } else { Display::None },
                flex_grow: 1.0,
            ) {
                PerformanceView(
                    dashboard,
                    bus,
                    theme,
                    keybindings,
                    color_depth: depth,
                    width,
                    height,
                    should_exit,
                    switch_view: switch_signal,
                    switch_view_back: switch_back_signal,
                    is_active: active == ViewKind::Performance,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_cycle_both_ways() {
        for v in ViewKind::ALL {
            assert_eq!(v.next().prev(), v);
        }
        assert_eq!(ViewKind::Performance.next(), ViewKind::Issues);
        assert_eq!(ViewKind::Issues.prev(), ViewKind::Performance);
    }

    #[test]
    fn configured_view_maps_over() {
        assert_eq!(ViewKind::from(DefaultView::Map), ViewKind::Map);
        assert_eq!(ViewKind::from(DefaultView::default()), ViewKind::Issues);
    }
}
