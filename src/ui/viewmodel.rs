//! View model types representing renderable UI state.
//!
//! View models are computed from application state by
//! `AppState::compute_viewmodel()` and consumed by the renderer. They contain
//! no business logic, only display-ready data: the windowed slice of visible
//! tree rows, the header and filter summary lines, and optional search bar
//! and empty state.
//!
//! # Example
//!
//! ```rust
//! use reportlens::ui::viewmodel::{FilterBarInfo, FooterInfo, HeaderInfo, UIViewModel};
//!
//! let vm = UIViewModel {
//!     display_items: vec![],
//!     selected_index: 0,
//!     header: HeaderInfo { title: " shop · stage ".to_string(), summary: String::new() },
//!     filter_bar: FilterBarInfo { text: "sort: Start time ↑".to_string() },
//!     footer: FooterInfo { keybindings: "q: quit".to_string(), error: None },
//!     empty_state: None,
//!     search_bar: None,
//!     details: None,
//! };
//! assert!(vm.display_items.is_empty());
//! ```

use crate::domain::Status;

/// Complete UI view model for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct UIViewModel {
    /// Rows inside the visible window, top to bottom.
    pub display_items: Vec<DisplayItem>,

    /// Index of the selected row within `display_items`.
    pub selected_index: usize,

    pub header: HeaderInfo,

    /// Active filters and sort, one line under the header.
    pub filter_bar: FilterBarInfo,

    pub footer: FooterInfo,

    /// Message shown instead of the table when nothing can be listed.
    pub empty_state: Option<EmptyState>,

    /// Present while the search query is being edited or is non-empty.
    pub search_bar: Option<SearchBarInfo>,

    /// Detail pane for the selected test or run, drawn below the table.
    pub details: Option<DetailPane>,
}

/// Tree level of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Module,
    Group,
    Test,
    /// One run inside an expanded group.
    Run,
}

/// Display information for one visible tree row.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub kind: RowKind,

    /// Nesting level: 0 for modules, 1 for their children, 2 for group runs.
    pub depth: usize,

    /// Disclosure marker for collapsible rows, empty for leaves.
    pub marker: &'static str,

    /// Display name, already truncated to the name column.
    pub name: String,

    /// Status shown in the status column. Groups show their worst run.
    pub status: Option<Status>,

    /// Free text in the status column for rows without a single status,
    /// such as a module's pass/fail tally.
    pub detail: String,

    /// Formatted duration, empty when unknown.
    pub duration: String,

    /// Formatted start time, empty when unknown.
    pub started: String,

    pub is_selected: bool,

    /// Character ranges of the name that match the search text.
    ///
    /// Each tuple is `(start_index, end_index)` in character indices.
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// Header display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Centered title: project, environment, and report path.
    pub title: String,
    /// Visible versus total tests and the per-status tally.
    pub summary: String,
}

/// One-line description of the active filters and sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBarInfo {
    pub text: String,
}

/// Footer display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    /// Keybinding help text for the current input mode.
    pub keybindings: String,

    /// First line of the selected test's failure, drawn above the
    /// keybindings in place of the border.
    pub error: Option<String>,
}

/// Empty state message display information.
///
/// Shown while the report is loading, when it failed to load, and when the
/// active filters hide every test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    /// Primary message (e.g., "No tests match your filters").
    pub message: String,

    /// Secondary explanatory text (e.g., "Press r to reset filters").
    pub subtitle: String,

    /// Render the message in the error color.
    pub is_error: bool,
}

/// Search bar display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarInfo {
    /// Current search query text.
    pub query: String,

    /// Whether keystrokes currently edit the query.
    pub is_editing: bool,
}

/// Scrolled window over everything the report says about one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPane {
    /// Name of the test or run, shown in the pane's top rule.
    pub title: String,

    /// Lines inside the window, top to bottom.
    pub lines: Vec<DetailLine>,

    /// Rows the pane takes, its top rule included.
    pub height: usize,

    pub more_above: bool,
    pub more_below: bool,
}

/// One pane line. Only the first line of a section carries its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    pub label: &'static str,
    pub text: String,
    pub is_error: bool,
}
