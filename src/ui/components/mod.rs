//! Composable UI component renderers.
//!
//! Each component renders one part of the pane and returns the next free
//! row.
//!
//! # Components
//!
//! - `header`: Title, test tally, and active filters
//! - `footer`: Keybinding hints
//! - `search`: Search input box
//! - `table`: The visible report tree
//! - `details`: Description, parameters, links, and traceback of one test
//! - `empty`: Loading, load failure, and "no matches" messages

mod details;
mod empty;
mod footer;
mod header;
mod search;
mod table;

use crate::ui::helpers::position_cursor;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::UIViewModel;

use details::render_details;
use empty::render_empty_state;
use footer::{render_error_line, render_footer};
use header::{render_filter_bar, render_header};
use search::render_search_bar;
use table::{render_table_headers, render_table_rows};

/// Renders a horizontal border line at the specified row.
///
/// # Returns
///
/// The next available row position (row + 1)
fn render_border(row: usize, color: &str, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::fg(color));
    print!("{}", "─".repeat(cols));
    print!("{}", Theme::reset());
    row + 1
}

/// Renders the full pane.
///
/// Layout structure:
/// ```text
/// [blank line]
/// [Title]
/// [Tally]
/// [Filters and sort]
/// [Border]
/// [Search Bar - 3 lines, when shown]
/// [Table Headers]            or   [Empty state message]
/// [Table Rows]
/// [Detail pane, when open]
/// [Border or selected test's error]
/// [Footer]
/// ```
pub fn render_layout(vm: &UIViewModel, theme: &Theme, cols: usize, rows: usize) {
    let mut current_row = 2;

    current_row = render_header(current_row, &vm.header, theme, cols);
    current_row = render_filter_bar(current_row, &vm.filter_bar, theme, cols);
    current_row = render_border(current_row, &theme.colors.border, cols);
    if let Some(search) = &vm.search_bar {
        current_row = render_search_bar(current_row, search, theme, cols);
    }

    if let Some(empty) = &vm.empty_state {
        render_empty_state(current_row, empty, theme, cols);
    } else {
        current_row = render_table_headers(current_row, theme, cols);
        let _current_row = render_table_rows(current_row, &vm.display_items, theme, cols);
    }

    let footer_start = rows.saturating_sub(1);
    let border_row = footer_start.saturating_sub(1);

    if let Some(details) = &vm.details {
        render_details(border_row.saturating_sub(details.height), details, theme, cols);
    }

    match &vm.footer.error {
        Some(error) => render_error_line(border_row, error, theme, cols),
        None => render_border(border_row, &theme.colors.border, cols),
    };
    render_footer(footer_start, &vm.footer, theme, cols);
}
