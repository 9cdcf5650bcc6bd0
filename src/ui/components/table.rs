//! Table component renderer.
//!
//! Renders the visible report tree as an indented table with NAME, STATUS,
//! DURATION, and STARTED columns. Module and group rows carry a disclosure
//! marker; statuses are colored per theme.

use crate::app::state::FIXED_COLUMNS_WIDTH;
use crate::ui::helpers::{self, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{DisplayItem, RowKind};

const STATUS_WIDTH: usize = 10;
const DURATION_WIDTH: usize = 10;
const STARTED_WIDTH: usize = FIXED_COLUMNS_WIDTH - STATUS_WIDTH - DURATION_WIDTH;

fn name_width(cols: usize) -> usize {
    cols.saturating_sub(FIXED_COLUMNS_WIDTH).max(10)
}

/// Renders the table column headers at the specified row.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_table_headers(row: usize, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(&theme.colors.header_fg));
    print!(
        "{:<name$}{:<status$}{:>duration$}{:>started$}",
        "  NAME",
        "STATUS",
        "DURATION",
        "STARTED",
        name = name_width(cols),
        status = STATUS_WIDTH,
        duration = DURATION_WIDTH,
        started = STARTED_WIDTH,
    );
    print!("{}", Theme::reset());
    row + 1
}

/// Renders all table rows starting at the specified row.
///
/// # Returns
///
/// The next available row position (row + number of items)
pub fn render_table_rows(row: usize, items: &[DisplayItem], theme: &Theme, cols: usize) -> usize {
    let mut current_row = row;
    for item in items {
        current_row = render_table_row(current_row, item, theme, cols);
    }
    current_row
}

/// Renders a single table row at the specified row position.
///
/// # Layout
///
/// ```text
/// [indent][marker] NAME [padding] STATUS  DURATION  STARTED [padding to fill line]
/// ```
///
/// # Styling Precedence
///
/// 1. Selection colors (full row background)
/// 2. Search match highlights and status colors (unless selected)
/// 3. Module color or normal text color
fn render_table_row(row: usize, item: &DisplayItem, theme: &Theme, cols: usize) -> usize {
    position_cursor(row, 1);

    let base_fg = if item.is_selected {
        &theme.colors.selection_fg
    } else if item.kind == RowKind::Module {
        &theme.colors.module_fg
    } else {
        &theme.colors.text_normal
    };

    if item.is_selected {
        print!("{}", Theme::bg(&theme.colors.selection_bg));
    }
    if item.kind == RowKind::Module {
        print!("{}", Theme::bold());
    }
    print!("{}", Theme::fg(base_fg));

    let indent = " ".repeat(item.depth * 2);
    let marker = if item.marker.is_empty() { " " } else { item.marker };
    print!("{indent}{marker} ");

    helpers::render_highlighted_text(&item.name, &item.highlight_ranges, theme, item.is_selected, base_fg);
    if item.is_selected {
        print!("{}", Theme::bg(&theme.colors.selection_bg));
    }

    let name_len = item.depth * 2 + 2 + item.name.chars().count();
    print!("{}", " ".repeat(name_width(cols).saturating_sub(name_len)));

    let status_text = item
        .status
        .as_ref()
        .map_or_else(|| item.detail.clone(), |status| status.as_upper().to_string());
    if let (Some(status), false) = (&item.status, item.is_selected) {
        print!("{}", Theme::fg(theme.status_color(status)));
    }
    print!("{status_text:<width$}", width = STATUS_WIDTH);
    print!("{}", Theme::fg(base_fg));

    print!(
        "{:>duration$}{:>started$}",
        item.duration,
        item.started,
        duration = DURATION_WIDTH,
        started = STARTED_WIDTH,
    );

    let line_len = name_width(cols).max(name_len) + FIXED_COLUMNS_WIDTH;
    print!("{}", " ".repeat(cols.saturating_sub(line_len)));

    print!("{}", Theme::reset());
    row + 1
}
