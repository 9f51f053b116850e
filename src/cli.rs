// One-shot commands: fetch once, print, exit.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Subcommand;

use crate::api::ReportsClient;
use crate::config::types::AppConfig;
use crate::dashboard::Dashboard;
use crate::filter::Stats;
use crate::map::{GridVisualizer, MapScene, MapSession, StatusPalette};
use crate::performance::PerformanceReport;
use crate::transform::lookup_status;
use crate::types::{Issue, IssueId, Roster};
use crate::util::{format_days, format_percent, truncate_to_width};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the issues matching a query.
    List {
        /// Filter query, e.g. `status:pending priority:high pothole`.
        #[arg(short, long)]
        query: Option<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print the status tile counts.
    Stats {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print resolution metrics, overall or for one department.
    Performance {
        #[arg(short, long)]
        department: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List the worker roster.
    Workers,
    /// Move an issue to a new status on the backend.
    Status {
        /// Issue id.
        id: String,
        /// Target status, e.g. `in_progress`, `resolved`, `verified`.
        target: String,
    },
    /// Draw the issue locations as a text heatmap.
    Heatmap {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long, default_value_t = 72)]
        width: u16,
        #[arg(long, default_value_t = 24)]
        height: u16,
    },
}

/// Run a one-shot command on a private Tokio runtime.
pub fn run(command: Command, config: &AppConfig) -> Result<()> {
    if let Command::Workers = command {
        print!("{}", format_workers(&config.roster()));
        return Ok(());
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run_remote(command, config))
}

async fn run_remote(command: Command, config: &AppConfig) -> Result<()> {
    let client = ReportsClient::from_config(&config.backend)?;
    let payload = client
        .fetch_reports()
        .await
        .with_context(|| format!("failed to load reports from {}", client.base_url()))?;
    if payload.skipped > 0 {
        tracing::warn!("cli: skipped {} malformed records", payload.skipped);
    }
    let mut dashboard = Dashboard::with_issues(config.roster(), payload.issues);

    match command {
        Command::List { query, json } => {
            apply_query(&mut dashboard, query.as_deref());
            let visible = dashboard.visible();
            if json {
                let issues: Vec<&Issue> = visible.iter().map(|issue| &**issue).collect();
                println!("{}", serde_json::to_string_pretty(&issues)?);
            } else {
                for line in format_issue_lines(&visible) {
                    println!("{line}");
                }
            }
        }
        Command::Stats { query, json } => {
            apply_query(&mut dashboard, query.as_deref());
            let stats = Stats::compute(&dashboard.visible());
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", format_stats(&stats));
            }
        }
        Command::Performance { department, json } => {
            let report = dashboard.performance(department.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", format_performance(&report));
            }
        }
        Command::Status { id, target } => {
            let Some(to) = lookup_status(&target) else {
                bail!("unknown status {target:?}");
            };
            let id = IssueId::parse(&id);
            let update = dashboard.begin_status_update(&id, to)?;
            client
                .update_status(&update.id, update.code)
                .await
                .with_context(|| format!("failed to update issue {id}"))?;
            println!("Issue {id}: {} \u{2192} {}", update.from, update.to);
        }
        Command::Heatmap {
            query,
            width,
            height,
        } => {
            apply_query(&mut dashboard, query.as_deref());
            println!("{}", render_heatmap(&dashboard.visible(), width, height)?);
        }
        Command::Workers => {}
    }
    Ok(())
}

fn apply_query(dashboard: &mut Dashboard, query: Option<&str>) {
    if let Some(q) = query {
        dashboard.set_query(q);
    }
}

// ---------------------------------------------------------------------------
// Plain-text output
// ---------------------------------------------------------------------------

pub fn format_issue_lines(issues: &[Arc<Issue>]) -> Vec<String> {
    issues
        .iter()
        .map(|i| {
            format!(
                "{:>6}  {:<14}  {:<6}  {:<18}  {:<18}  {}",
                i.id.to_string(),
                i.status.label(),
                i.priority.label(),
                truncate_to_width(i.category.label(), 18),
                truncate_to_width(i.assigned_to.name(), 18),
                truncate_to_width(&i.title, 50),
            )
        })
        .collect()
}

pub fn format_stats(stats: &Stats) -> String {
    format!(
        "Total                  {}\nPending                {}\nActive                 {}\nAwaiting verification  {}\nVerified               {}\nHigh priority          {}\n",
        stats.total,
        stats.pending,
        stats.active,
        stats.awaiting_verification,
        stats.verified,
        stats.high_priority,
    )
}

pub fn format_performance(report: &PerformanceReport) -> String {
    let mut out = format!(
        "{}\n  Total {} \u{b7} Resolved {} ({}) \u{b7} Avg. resolution {}\n  Pending {} \u{b7} High priority pending {}\n",
        report.department.as_deref().unwrap_or("All departments"),
        report.total,
        report.resolved,
        format_percent(report.resolution_rate),
        format_days(report.avg_resolution_days),
        report.pending,
        report.high_priority_pending,
    );
    if !report.departments.is_empty() {
        out.push_str("\nDepartment             Total  Resolved  Pending\n");
        for row in &report.departments {
            out.push_str(&format!(
                "{:<22} {:>5}  {:>8}  {:>7}\n",
                truncate_to_width(&row.department, 22),
                row.total,
                row.resolved,
                row.pending
            ));
        }
    }
    if !report.trend.is_empty() {
        out.push_str("\nMonth   Resolved  Open\n");
        for p in &report.trend {
            out.push_str(&format!("{:<7} {:>8}  {:>4}\n", p.month.label(), p.resolved, p.open));
        }
    }
    out
}

pub fn format_workers(roster: &Roster) -> String {
    roster
        .workers()
        .iter()
        .map(|w| format!("{:>3}  {:<20}  {:<18}  {} active\n", w.id, w.name, w.department, w.active_issues))
        .collect()
}

/// Heat layer of `issues` on a `width` x `height` character grid.
pub fn render_heatmap(issues: &[Arc<Issue>], width: u16, height: u16) -> Result<String> {
    let scene = MapScene::from_issues(issues, &StatusPalette::default());
    let unlocated = scene.unlocated;
    let mut session = MapSession::mount(GridVisualizer::new(width, height));
    session.set_heatmap(true)?;
    session.update(scene)?;
    let mut text = session.visualizer().to_text();
    if unlocated > 0 {
        text.push_str(&format!("\n({unlocated} issues without a location not drawn)"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform_report;
    use crate::types::RawReport;

    fn issue(id: i64, lat: Option<f64>, lng: Option<f64>) -> Arc<Issue> {
        let mut raw = RawReport::with_id(id);
        raw.latitude = lat;
        raw.longitude = lng;
        Arc::new(transform_report(&raw))
    }

    #[test]
    fn issue_lines_lead_with_id_and_status() {
        let lines = format_issue_lines(&[issue(42, None, None)]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].trim_start().starts_with("42  Pending"));
    }

    #[test]
    fn stats_text_lists_every_tile() {
        let text = format_stats(&Stats::default());
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("Awaiting verification"));
    }

    #[test]
    fn empty_performance_uses_dashes() {
        let report = PerformanceReport::compute::<Issue>(&[], None);
        let text = format_performance(&report);
        assert!(text.starts_with("All departments"));
        assert!(text.contains("Resolved 0 (-)"));
        assert!(!text.contains("Department "));
    }

    #[test]
    fn heatmap_notes_unlocated_issues() {
        let issues = vec![
            issue(1, Some(18.52), Some(73.85)),
            issue(2, Some(18.50), Some(73.80)),
            issue(3, None, None),
        ];
        let text = render_heatmap(&issues, 20, 6).unwrap();
        assert!(text.ends_with("(1 issues without a location not drawn)"));
        assert!(text.chars().any(|c| c != ' ' && c != '\n'));
    }

    #[test]
    fn heatmap_refuses_tiny_grids() {
        assert!(render_heatmap(&[], 4, 2).is_err());
    }

    #[test]
    fn workers_are_listed_in_roster_order() {
        let text = format_workers(&Roster::builtin());
        assert!(text.lines().next().is_some_and(|l| l.contains("Rajesh Kumar")));
    }
}
