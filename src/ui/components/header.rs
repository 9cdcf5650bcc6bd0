//! Header component renderers.
//!
//! Three lines at the top of the pane: the centered title, the test tally,
//! and the active filters and sort.

use crate::ui::helpers::{position_cursor, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{FilterBarInfo, HeaderInfo};

/// Renders the title bar and the tally line below it.
///
/// The title is centered with bold styling; the tally is left-aligned and
/// dimmed. Both lines are padded to the full terminal width.
///
/// # Returns
///
/// The next available row position (row + 2)
pub fn render_header(row: usize, header: &HeaderInfo, theme: &Theme, cols: usize) -> usize {
    let title = truncate(&header.title, cols);
    let title_len = title.chars().count();
    let padding = (cols.saturating_sub(title_len)) / 2;

    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(&theme.colors.header_fg));
    if let Some(bg) = &theme.colors.header_bg {
        print!("{}", Theme::bg(bg));
    }

    print!("{}", " ".repeat(padding));
    print!("{title}");
    print!("{}", " ".repeat(cols.saturating_sub(padding + title_len)));
    print!("{}", Theme::reset());

    let summary = truncate(&format!(" {}", header.summary), cols);
    position_cursor(row + 1, 1);
    print!("{}", Theme::fg(&theme.colors.text_dim));
    print!("{summary}");
    print!("{}", " ".repeat(cols.saturating_sub(summary.chars().count())));
    print!("{}", Theme::reset());

    row + 2
}

/// Renders the filter and sort summary line.
///
/// # Returns
///
/// The next available row position (row + 1)
pub fn render_filter_bar(row: usize, bar: &FilterBarInfo, theme: &Theme, cols: usize) -> usize {
    let text = truncate(&format!(" {}", bar.text), cols);

    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.text_normal));
    print!("{text}");
    print!("{}", " ".repeat(cols.saturating_sub(text.chars().count())));
    print!("{}", Theme::reset());
    row + 1
}
