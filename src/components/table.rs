use iocraft::prelude::*;

use crate::color::{Color as AppColor, ColorDepth};
use crate::util::truncate_to_width;

// ---------------------------------------------------------------------------
// Column / cell definitions
// ---------------------------------------------------------------------------

/// A table column. Widths are shares of the space left after every column
/// got its `min_width`.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub weight: f32,
    pub min_width: u16,
    pub align: TextAlign,
}

impl Column {
    pub const fn new(header: &'static str, weight: f32, min_width: u16) -> Self {
        Self {
            header,
            weight,
            min_width,
            align: TextAlign::Left,
        }
    }

    pub const fn right(mut self) -> Self {
        self.align = TextAlign::Right;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub color: Option<AppColor>,
    pub bold: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: false,
        }
    }

    pub fn colored(text: impl Into<String>, color: AppColor) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Cells in column order.
pub type Row = Vec<Cell>;

// ---------------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------------

/// Scroll offset that keeps `cursor` inside a window of `visible` rows.
pub fn scroll_to_cursor(cursor: usize, offset: usize, visible: usize) -> usize {
    let visible = visible.max(1);
    if cursor < offset {
        cursor
    } else if cursor >= offset + visible {
        cursor + 1 - visible
    } else {
        offset
    }
}

// ---------------------------------------------------------------------------
// Pre-rendered table data (all owned)
// ---------------------------------------------------------------------------

pub struct RenderedTable {
    pub header_cells: Vec<HeaderCell>,
    pub body_rows: Vec<RenderedRow>,
    pub total_width: u32,
    pub header_fg: Color,
    pub border_fg: Color,
    pub empty_message: Option<String>,
}

pub struct HeaderCell {
    pub text: String,
    pub width: u32,
    pub align: TextAlign,
}

pub struct RenderedRow {
    pub key: usize,
    pub bg: Option<Color>,
    pub cells: Vec<RenderedCell>,
}

pub struct RenderedCell {
    pub text: String,
    pub fg: Color,
    pub weight: Weight,
    pub width: u32,
    pub align: TextAlign,
}

pub struct TableBuildConfig<'a> {
    pub columns: &'a [Column],
    pub rows: &'a [Row],
    pub cursor: usize,
    pub scroll_offset: usize,
    pub visible_rows: usize,
    pub total_width: u16,
    pub depth: ColorDepth,
    pub selected_bg: Option<AppColor>,
    pub header_color: Option<AppColor>,
    pub border_color: Option<AppColor>,
    pub empty_message: Option<&'a str>,
}

impl RenderedTable {
    pub fn build(cfg: &TableBuildConfig<'_>) -> Self {
        let depth = cfg.depth;
        let widths = compute_column_widths(cfg.columns, cfg.total_width);
        let header_fg = cfg
            .header_color
            .map_or(Color::White, |c| c.to_crossterm_color(depth));
        let border_fg = cfg
            .border_color
            .map_or(Color::DarkGrey, |c| c.to_crossterm_color(depth));
        let selected_bg = cfg.selected_bg.map(|c| c.to_crossterm_color(depth));

        let header_cells = cfg
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| HeaderCell {
                text: col.header.to_owned(),
                width: u32::from(w),
                align: col.align,
            })
            .collect();

        let body_rows = cfg
            .rows
            .iter()
            .enumerate()
            .skip(cfg.scroll_offset)
            .take(cfg.visible_rows)
            .map(|(idx, row)| RenderedRow {
                key: idx,
                bg: if idx == cfg.cursor { selected_bg } else { None },
                cells: cfg
                    .columns
                    .iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(ci, (col, &w))| {
                        let cell = row.get(ci);
                        // One column of padding between cells.
                        let text = cell.map_or_else(String::new, |c| {
                            truncate_to_width(&c.text, usize::from(w.saturating_sub(1)))
                        });
                        RenderedCell {
                            text,
                            fg: cell
                                .and_then(|c| c.color)
                                .map_or(Color::Reset, |c| c.to_crossterm_color(depth)),
                            weight: if cell.is_some_and(|c| c.bold) {
                                Weight::Bold
                            } else {
                                Weight::Normal
                            },
                            width: u32::from(w),
                            align: col.align,
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            header_cells,
            body_rows,
            total_width: u32::from(cfg.total_width),
            header_fg,
            border_fg,
            empty_message: if cfg.rows.is_empty() {
                cfg.empty_message.map(str::to_owned)
            } else {
                None
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ScrollableTable component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct ScrollableTableProps {
    pub table: Option<RenderedTable>,
}

#[component]
pub fn ScrollableTable(props: &mut ScrollableTableProps) -> impl Into<AnyElement<'static>> {
    let Some(table) = props.table.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(flex_direction: FlexDirection::Column, width: table.total_width) {
            View(
                border_style: BorderStyle::Single,
                border_edges: Edges::Bottom,
                border_color: table.border_fg,
            ) {
                #(table.header_cells.into_iter().enumerate().map(|(i, hc)| {
                    element! {
                        View(key: i, width: hc.width) {
                            Text(
                                content: hc.text,
                                weight: Weight::Bold,
                                color: table.header_fg,
                                wrap: TextWrap::NoWrap,
                                align: hc.align,
                            )
                        }
                    }
                }))
            }

            #(table.empty_message.into_iter().map(|msg| {
                element! {
                    View(padding_top: 1, padding_left: 2) {
                        Text(content: msg, color: Color::DarkGrey)
                    }
                }
            }))
            #(table.body_rows.into_iter().map(|row| {
                element! {
                    View(key: row.key, background_color: row.bg.unwrap_or(Color::Reset)) {
                        #(row.cells.into_iter().enumerate().map(|(ci, cell)| {
                            element! {
                                View(key: ci, width: cell.width) {
                                    Text(
                                        content: cell.text,
                                        color: cell.fg,
                                        weight: cell.weight,
                                        wrap: TextWrap::NoWrap,
                                        align: cell.align,
                                    )
                                }
                            }
                        }))
                    }
                }
            }))
        }
    }
    .into_any()
}

// ---------------------------------------------------------------------------
// Column width computation
// ---------------------------------------------------------------------------

fn compute_column_widths(columns: &[Column], total: u16) -> Vec<u16> {
    let min_total: u16 = columns.iter().map(|c| c.min_width).sum();
    let spare = f32::from(total.saturating_sub(min_total));
    let weight_sum: f32 = columns.iter().map(|c| c.weight).sum();

    let mut widths: Vec<u16> = columns
        .iter()
        .map(|c| {
            let share = if weight_sum > 0.0 {
                spare * c.weight / weight_sum
            } else {
                0.0
            };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let extra = share.floor() as u16;
            c.min_width + extra
        })
        .collect();

    // Rounding leftovers go to the widest-weighted column.
    let used: u16 = widths.iter().sum();
    if used < total
        && let Some((idx, _)) = columns
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.weight.total_cmp(&b.1.weight))
    {
        widths[idx] += total - used;
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("ID", 0.0, 6),
            Column::new("Title", 3.0, 10),
            Column::new("Status", 1.0, 10),
            Column::new("Reported", 0.0, 8).right(),
        ]
    }

    #[test]
    fn widths_fill_total_and_respect_minimums() {
        let widths = compute_column_widths(&columns(), 100);
        assert_eq!(widths.iter().sum::<u16>(), 100);
        assert_eq!(widths[0], 6);
        assert_eq!(widths[3], 8);
        assert!(widths[1] > widths[2]);
    }

    #[test]
    fn narrow_terminal_falls_back_to_minimums() {
        let widths = compute_column_widths(&columns(), 20);
        assert_eq!(widths, vec![6, 10, 10, 8]);
    }

    #[test]
    fn scroll_follows_cursor() {
        assert_eq!(scroll_to_cursor(0, 0, 10), 0);
        assert_eq!(scroll_to_cursor(12, 0, 10), 3);
        assert_eq!(scroll_to_cursor(2, 5, 10), 2);
        assert_eq!(scroll_to_cursor(7, 5, 10), 5);
    }

    #[test]
    fn only_the_window_is_rendered() {
        let rows: Vec<Row> = (0..30).map(|i| vec![Cell::plain(i.to_string())]).collect();
        let cols = [Column::new("N", 1.0, 4)];
        let table = RenderedTable::build(&TableBuildConfig {
            columns: &cols,
            rows: &rows,
            cursor: 12,
            scroll_offset: 10,
            visible_rows: 5,
            total_width: 20,
            depth: ColorDepth::TrueColor,
            selected_bg: Some(AppColor::Ansi256(237)),
            header_color: None,
            border_color: None,
            empty_message: Some("nothing"),
        });
        assert_eq!(table.body_rows.len(), 5);
        assert_eq!(table.body_rows[0].key, 10);
        assert!(table.body_rows[2].bg.is_some());
        assert!(table.body_rows[0].bg.is_none());
        assert!(table.empty_message.is_none());
    }
}
