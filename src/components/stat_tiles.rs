use iocraft::prelude::*;

use crate::color::{Color as AppColor, ColorDepth};
use crate::filter::{IssueFilter, StatTile, Stats};
use crate::theme::ResolvedTheme;
use crate::types::IssueStatus;

// ---------------------------------------------------------------------------
// StatTiles component: the counter header of the issues view
// ---------------------------------------------------------------------------

pub struct RenderedTile {
    pub label: String,
    pub count: String,
    pub accent: Color,
    pub is_selected: bool,
}

pub struct RenderedStatTiles {
    pub tiles: Vec<RenderedTile>,
    pub label_fg: Color,
    pub border_fg: Color,
}

fn tile_color(tile: StatTile, theme: &ResolvedTheme) -> AppColor {
    match tile {
        StatTile::Total => theme.text_primary,
        StatTile::Pending => theme.status_color(IssueStatus::Pending),
        StatTile::Active => theme.status_color(IssueStatus::InProgress),
        StatTile::AwaitingVerification => theme.status_color(IssueStatus::WorkCompleted),
        StatTile::Verified => theme.status_color(IssueStatus::Verified),
        StatTile::HighPriority => theme.priority_high,
    }
}

impl RenderedStatTiles {
    pub fn build(
        stats: &Stats,
        filter: &IssueFilter,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        let tiles = StatTile::ALL
            .iter()
            .enumerate()
            .map(|(i, &tile)| RenderedTile {
                label: format!("{} {}", i + 1, tile.label()),
                count: tile.count(stats).to_string(),
                accent: tile_color(tile, theme).to_crossterm_color(depth),
                is_selected: tile.is_selected(filter),
            })
            .collect();

        Self {
            tiles,
            label_fg: theme.text_secondary.to_crossterm_color(depth),
            border_fg: theme.border_faint.to_crossterm_color(depth),
        }
    }
}

#[derive(Default, Props)]
pub struct StatTilesProps {
    pub tiles: Option<RenderedStatTiles>,
}

#[component]
pub fn StatTiles(props: &mut StatTilesProps) -> impl Into<AnyElement<'static>> {
    let Some(st) = props.tiles.take() else {
        return element! { View }.into_any();
    };
    let label_fg = st.label_fg;

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Bottom,
            border_color: st.border_fg,
            padding_left: 1,
        ) {
            #(st.tiles.into_iter().enumerate().map(|(i, tile)| {
                let (count_fg, bg) = if tile.is_selected {
                    (Color::White, tile.accent)
                } else {
                    (tile.accent, Color::Reset)
                };
                element! {
                    View(key: i, padding_right: 2, background_color: bg) {
                        Text(
                            content: format!(" {} ", tile.count),
                            color: count_fg,
                            weight: Weight::Bold,
                            wrap: TextWrap::NoWrap,
                        )
                        Text(content: tile.label, color: label_fg, wrap: TextWrap::NoWrap)
                    }
                }
            }))
        }
    }
    .into_any()
}
