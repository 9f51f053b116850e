use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;
use crate::types::{Issue, IssueStatus};
use crate::util::format_timestamp;
use crate::workflow;

// ---------------------------------------------------------------------------
// Preview pane: details of the issue under the cursor
// ---------------------------------------------------------------------------

/// One `label: value` line of the metadata block.
pub struct MetaLine {
    pub label: &'static str,
    pub value: String,
    pub value_fg: Color,
}

pub struct RenderedPreview {
    pub title: String,
    pub pill_text: String,
    pub pill_bg: Color,
    pub meta: Vec<MetaLine>,
    pub description: String,
    pub work_proof: Option<Vec<String>>,
    pub next_steps: String,
    pub width: u32,
    pub title_fg: Color,
    pub label_fg: Color,
    pub text_fg: Color,
    pub faint_fg: Color,
    pub border_fg: Color,
}

pub struct PreviewBuildConfig<'a> {
    pub issue: &'a Issue,
    pub in_flight: bool,
    pub width: u16,
    pub date_format: &'a str,
    pub theme: &'a ResolvedTheme,
    pub depth: ColorDepth,
}

impl RenderedPreview {
    pub fn build(cfg: &PreviewBuildConfig<'_>) -> Self {
        let issue = cfg.issue;
        let t = cfg.theme;
        let depth = cfg.depth;
        let text_fg = t.text_primary.to_crossterm_color(depth);
        let plain = |label, value: String| MetaLine {
            label,
            value,
            value_fg: text_fg,
        };

        let mut meta = vec![
            MetaLine {
                label: "Priority",
                value: issue.priority.label().to_owned(),
                value_fg: t.priority_color(issue.priority).to_crossterm_color(depth),
            },
            plain("Category", issue.category.label().to_owned()),
            plain("Department", issue.department.clone()),
            MetaLine {
                label: "Assignee",
                value: issue.assigned_to.name().to_owned(),
                value_fg: if issue.assigned_to.is_unassigned() {
                    t.text_faint.to_crossterm_color(depth)
                } else {
                    text_fg
                },
            },
            plain(
                "Reporter",
                format!("{} ({})", issue.reporter.name, issue.reporter.phone),
            ),
            plain(
                "Reported",
                format_timestamp(issue.reported_time(), &issue.reported_at, cfg.date_format),
            ),
        ];
        if let Some(raw) = &issue.resolved_at {
            meta.push(plain(
                "Resolved",
                format_timestamp(issue.resolved_time(), raw, cfg.date_format),
            ));
        }
        meta.push(plain("Location", location_text(issue)));
        if issue.images > 0 {
            meta.push(plain("Photos", issue.images.to_string()));
        }

        let work_proof = issue.work_proof.as_ref().map(|wp| {
            let mut lines = vec![wp.summary.clone(), format!("by {}", wp.submitted_by)];
            if let Some(url) = &wp.image_url {
                lines.push(url.clone());
            }
            lines
        });

        Self {
            title: format!("#{} {}", issue.id, issue.title),
            pill_text: format!(" {} ", issue.status.label()),
            pill_bg: t.status_color(issue.status).to_crossterm_color(depth),
            meta,
            description: if issue.description.trim().is_empty() {
                "No description provided.".to_owned()
            } else {
                issue.description.clone()
            },
            work_proof,
            next_steps: next_steps_text(issue.status, cfg.in_flight),
            width: u32::from(cfg.width),
            title_fg: text_fg,
            label_fg: t.text_secondary.to_crossterm_color(depth),
            text_fg,
            faint_fg: t.text_faint.to_crossterm_color(depth),
            border_fg: t.border_faint.to_crossterm_color(depth),
        }
    }
}

fn location_text(issue: &Issue) -> String {
    match &issue.location {
        Some(loc) => {
            let coords = format!("{:.4}, {:.4}", loc.lat, loc.lng);
            match &loc.address {
                Some(addr) => format!("{addr} ({coords})"),
                None => coords,
            }
        }
        None => "Not provided".to_owned(),
    }
}

/// What the operator can do next with an issue in `status`.
fn next_steps_text(status: IssueStatus, in_flight: bool) -> String {
    if in_flight {
        return "Status update pending\u{2026}".to_owned();
    }
    let mut steps: Vec<String> = Vec::new();
    if workflow::accepts_assignment(status) {
        steps.push("a assign".to_owned());
    }
    let targets = workflow::update_targets(status);
    if !targets.is_empty() {
        let names: Vec<&str> = targets.iter().map(|s| s.label()).collect();
        steps.push(format!("s \u{2192} {}", names.join(" / ")));
    }
    if steps.is_empty() {
        "Closed".to_owned()
    } else {
        steps.join("   ")
    }
}

// ---------------------------------------------------------------------------
// Preview component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct PreviewProps {
    pub preview: Option<RenderedPreview>,
}

#[component]
pub fn Preview(props: &mut PreviewProps) -> impl Into<AnyElement<'static>> {
    let Some(p) = props.preview.take() else {
        return element! { View }.into_any();
    };
    let label_fg = p.label_fg;
    let faint_fg = p.faint_fg;
    let text_fg = p.text_fg;

    element! {
        View(
            width: p.width,
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Single,
            border_edges: Edges::Left,
            border_color: p.border_fg,
            padding_left: 1,
            padding_right: 1,
            overflow: Overflow::Hidden,
        ) {
            Text(content: p.title, color: p.title_fg, weight: Weight::Bold)
            View(margin_top: 1) {
                View(background_color: p.pill_bg) {
                    Text(content: p.pill_text, color: Color::White, weight: Weight::Bold, wrap: TextWrap::NoWrap)
                }
            }
            View(margin_top: 1, flex_direction: FlexDirection::Column) {
                #(p.meta.into_iter().enumerate().map(|(i, line)| {
                    element! {
                        View(key: i) {
                            Text(content: format!("{:<11}", line.label), color: label_fg, wrap: TextWrap::NoWrap)
                            Text(content: line.value, color: line.value_fg, wrap: TextWrap::NoWrap)
                        }
                    }
                }))
            }
            View(
                margin_top: 1,
                border_style: BorderStyle::Single,
                border_edges: Edges::Top,
                border_color: faint_fg,
            ) {
                Text(content: p.description, color: text_fg)
            }
            #(p.work_proof.map(|lines| {
                element! {
                    View(margin_top: 1, flex_direction: FlexDirection::Column) {
                        Text(content: "Work proof", color: label_fg, weight: Weight::Bold)
                        #(lines.into_iter().enumerate().map(|(i, line)| {
                            element! {
                                View(key: i) {
                                    Text(content: line, color: text_fg)
                                }
                            }
                        }))
                    }
                }
            }))
            View(margin_top: 1) {
                Text(content: p.next_steps, color: faint_fg, wrap: TextWrap::NoWrap)
            }
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform_report;
    use crate::types::{Location, RawReport};

    fn build(issue: &Issue, in_flight: bool) -> RenderedPreview {
        RenderedPreview::build(&PreviewBuildConfig {
            issue,
            in_flight,
            width: 40,
            date_format: "%Y-%m-%d",
            theme: &ResolvedTheme::default(),
            depth: ColorDepth::TrueColor,
        })
    }

    #[test]
    fn pending_issue_offers_assignment_only() {
        let mut raw = RawReport::with_id(7);
        raw.status = Some("PENDING".to_owned());
        let p = build(&transform_report(&raw), false);
        assert_eq!(p.next_steps, "a assign");
        assert_eq!(p.title, format!("#7 {}", transform_report(&raw).title));
    }

    #[test]
    fn in_progress_offers_completion() {
        let mut raw = RawReport::with_id(8);
        raw.status = Some("IN_PROGRESS".to_owned());
        let p = build(&transform_report(&raw), false);
        assert!(p.next_steps.contains("Work Completed"));
        assert!(build(&transform_report(&raw), true).next_steps.contains("pending"));
    }

    #[test]
    fn location_shows_address_and_coordinates() {
        let mut issue = transform_report(&RawReport::with_id(9));
        assert_eq!(location_text(&issue), "Not provided");
        issue.location = Some(Location {
            lat: 18.52,
            lng: 73.85,
            address: Some("FC Road".to_owned()),
        });
        assert_eq!(location_text(&issue), "FC Road (18.5200, 73.8500)");
    }

    #[test]
    fn verified_issue_is_closed() {
        assert_eq!(next_steps_text(IssueStatus::Verified, false), "Closed");
    }
}
