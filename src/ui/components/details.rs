//! Detail pane for the selected test or run.

use crate::ui::helpers::{position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::DetailPane;

/// Width of the section label column; `description` is the longest label.
const LABEL_WIDTH: usize = 11;

/// Renders the pane from `row` down: a titled rule, then one row per line.
///
/// Section labels are dimmed; failure lines use the error color. Arrows on
/// the rule mark lines scrolled out of view.
///
/// # Returns
///
/// The next available row position
pub fn render_details(row: usize, pane: &DetailPane, theme: &Theme, cols: usize) -> usize {
    let arrows = match (pane.more_above, pane.more_below) {
        (true, true) => " ↑↓",
        (true, false) => " ↑",
        (false, true) => " ↓",
        (false, false) => "",
    };
    let rule = truncate(&format!("── {}{arrows} ", pane.title), cols);
    let rule_len = rule.chars().count();

    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.border));
    print!("{rule}");
    print!("{}", "─".repeat(cols.saturating_sub(rule_len)));
    print!("{}", Theme::reset());

    for (offset, line) in pane.lines.iter().enumerate() {
        let label = format!(" {:<width$} ", line.label, width = LABEL_WIDTH);
        let text_width = cols.saturating_sub(LABEL_WIDTH + 2);
        let text = truncate(&line.text, text_width);
        let color = if line.is_error {
            &theme.colors.error_fg
        } else {
            &theme.colors.text_normal
        };

        position_cursor(row + 1 + offset, 1);
        print!("{}", Theme::fg(&theme.colors.text_dim));
        print!("{label}");
        print!("{}", Theme::fg(color));
        print!("{text}");
        print!("{}", " ".repeat(text_width.saturating_sub(text.chars().count())));
        print!("{}", Theme::reset());
    }

    row + pane.height
}
