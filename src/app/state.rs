//! Application state management and view model computation.
//!
//! [`AppState`] is the single source of truth for the plugin thread: the
//! loaded report, the raw control state, the active sort, the expansion
//! flags, and the cursor over the flattened list of visible rows.
//!
//! # Derived State
//!
//! Every control change goes through [`AppState::refresh`], which normalizes
//! the controls, runs one engine pass over the report (filter, sort, and
//! visibility), and rebuilds the visible rows. The cursor follows the selected
//! node by id, so re-sorting or filtering does not make it jump to an
//! unrelated row.
//!
//! # Example
//!
//! ```rust
//! use reportlens::app::AppState;
//! use reportlens::engine::SortSpec;
//! use reportlens::ui::Theme;
//!
//! let mut state = AppState::new(Theme::default(), SortSpec::default());
//! state.refresh();
//! let viewmodel = state.compute_viewmodel(24, 80);
//! assert!(viewmodel.empty_state.is_some());
//! ```

use super::modes::InputMode;
use crate::domain::{Entry, Module, Report, Status, TestNode};
use crate::engine::{
    self, apply, normalize, restore_expanded, ApplyOutcome, FilterSpec, Selection, SortField,
    SortSpec, ALL_BUTTON,
};
use crate::infrastructure::display_path;
use crate::storage::PersistedView;
use crate::ui::helpers::{format_duration, format_start_time, match_ranges, truncate};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{
    DetailLine, DetailPane, DisplayItem, EmptyState, FilterBarInfo, FooterInfo, HeaderInfo,
    RowKind, SearchBarInfo, UIViewModel,
};
use std::collections::BTreeMap;

/// Width of the status, duration, and start time columns together.
pub const FIXED_COLUMNS_WIDTH: usize = 32;

/// One visible row of the flattened tree, by position in the report.
///
/// Indices are valid until the next engine pass reorders siblings; the row
/// list is rebuilt after every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    Module(usize),
    /// A direct child of a module: a single test or a group.
    Node(usize, usize),
    /// One run of a group.
    Run(usize, usize, usize),
}

/// What a navigation request changed, so the handler can persist it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    /// The filters were cleared because they hid the target.
    pub filters_reset: bool,
    /// Ids of modules and groups that were opened to reveal the target.
    pub opened: Vec<String>,
}

/// Central application state container.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The loaded report. `None` until the worker answers.
    pub report: Option<Report>,

    /// Report path as configured, for the header and loading message.
    pub report_path: String,

    /// Why the report could not be loaded, if it could not.
    pub load_error: Option<String>,

    /// Raw control state, exactly as the user left it.
    pub selection: Selection,

    /// Normalized form of `selection`, recomputed by [`refresh`](Self::refresh).
    pub filters: FilterSpec,

    /// Sort chosen by the user; `None` means `default_sort`.
    pub sort: Option<SortSpec>,

    /// Sort used when the user has not picked one.
    pub default_sort: SortSpec,

    /// Expansion flags recorded so far, keyed by module or group id.
    ///
    /// Kept here as well as in storage so flags restored before the report
    /// arrives can still be applied to it.
    pub expanded: BTreeMap<String, bool>,

    /// Result of the last engine pass.
    pub outcome: ApplyOutcome,

    /// Visible rows in display order.
    pub rows: Vec<RowRef>,

    /// Zero-based cursor into `rows`.
    pub selected_index: usize,

    pub input_mode: InputMode,

    pub theme: Theme,

    /// Node to navigate to as soon as the report is loaded.
    pub pending_focus: Option<String>,

    /// Whether persisted view state has been applied.
    pub state_restored: bool,

    /// Whether the detail pane is open. It only shows while the cursor is on
    /// a test or run.
    pub details_open: bool,

    /// First detail line shown in the pane.
    pub details_scroll: usize,
}

impl AppState {
    /// Creates an empty state waiting for the report and persisted view.
    #[must_use]
    pub fn new(theme: Theme, default_sort: SortSpec) -> Self {
        Self {
            report: None,
            report_path: String::new(),
            load_error: None,
            selection: Selection::default(),
            filters: FilterSpec::default(),
            sort: None,
            default_sort,
            expanded: BTreeMap::new(),
            outcome: ApplyOutcome::default(),
            rows: Vec::new(),
            selected_index: 0,
            input_mode: InputMode::Normal,
            theme,
            pending_focus: None,
            state_restored: false,
            details_open: false,
            details_scroll: 0,
        }
    }

    /// The sort the engine runs with.
    #[must_use]
    pub fn active_sort(&self) -> SortSpec {
        self.sort.unwrap_or(self.default_sort)
    }

    /// Installs a freshly loaded report and applies recorded expansion flags
    /// and the current controls to it.
    pub fn set_report(&mut self, mut report: Report) {
        restore_expanded(&mut report.modules, &self.expanded);
        self.report = Some(report);
        self.load_error = None;
        self.rows.clear();
        self.selected_index = 0;
        self.refresh();
    }

    /// Applies persisted filters, sort, and expansion flags.
    ///
    /// Flags for ids missing from the report are kept but have no effect.
    pub fn restore_view(&mut self, view: PersistedView) {
        let _span = tracing::debug_span!("restore_view",
            has_sort = view.sort.is_some(),
            expanded_count = view.expanded.len()
        )
        .entered();

        self.selection = Selection::from(view.filters);
        self.sort = view.sort;
        self.expanded = view.expanded;
        if let Some(report) = self.report.as_mut() {
            restore_expanded(&mut report.modules, &self.expanded);
        }
        self.state_restored = true;
        self.refresh();
    }

    /// Normalizes the controls, runs one engine pass, and rebuilds the rows.
    pub fn refresh(&mut self) {
        let keep = self.selected_id();
        self.filters = normalize(&self.selection);
        let sort = self.active_sort();

        self.outcome = match self.report.as_mut() {
            Some(report) => apply(&mut report.modules, &self.filters, &sort),
            None => ApplyOutcome::default(),
        };

        self.rebuild_rows(keep.as_deref());

        tracing::debug!(
            visible_modules = self.outcome.visible_modules,
            visible_entries = self.outcome.visible_entries,
            row_count = self.rows.len(),
            "view refreshed"
        );
    }

    /// Rebuilds the visible rows, keeping the cursor on `keep` if it is
    /// still listed and clamping it otherwise.
    fn rebuild_rows(&mut self, keep: Option<&str>) {
        self.rows = self.report.as_ref().map_or_else(Vec::new, |r| flatten(&r.modules));

        let kept = keep.and_then(|id| {
            self.rows
                .iter()
                .position(|row| self.row_id(*row) == Some(id))
        });

        self.selected_index = match kept {
            Some(index) => index,
            None if self.rows.is_empty() => 0,
            None => self.selected_index.min(self.rows.len() - 1),
        };
    }

    fn modules(&self) -> &[Module] {
        match &self.report {
            Some(report) => &report.modules,
            None => &[],
        }
    }

    /// Id of the module, test, group, or run a row shows.
    #[must_use]
    pub fn row_id(&self, row: RowRef) -> Option<&str> {
        let modules = self.modules();
        match row {
            RowRef::Module(m) => modules.get(m).map(|module| module.id.as_str()),
            RowRef::Node(m, n) => modules.get(m)?.nodes.get(n).map(TestNode::id),
            RowRef::Run(m, n, e) => match modules.get(m)?.nodes.get(n)? {
                TestNode::Group(group) => group.entries.get(e).map(|entry| entry.id.as_str()),
                TestNode::Single(_) => None,
            },
        }
    }

    #[must_use]
    pub fn selected_row(&self) -> Option<RowRef> {
        self.rows.get(self.selected_index).copied()
    }

    /// The test or run under the cursor; `None` on module and group rows.
    #[must_use]
    pub fn selected_entry(&self) -> Option<&Entry> {
        let modules = self.modules();
        match self.selected_row()? {
            RowRef::Module(_) => None,
            RowRef::Node(m, n) => match modules.get(m)?.nodes.get(n)? {
                TestNode::Single(entry) => Some(entry),
                TestNode::Group(_) => None,
            },
            RowRef::Run(m, n, e) => match modules.get(m)?.nodes.get(n)? {
                TestNode::Group(group) => group.entries.get(e),
                TestNode::Single(_) => None,
            },
        }
    }

    /// Failure text of the selected test or run, if it recorded one.
    #[must_use]
    pub fn selected_error(&self) -> Option<&str> {
        self.selected_entry()?.error.as_deref()
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<String> {
        self.selected_row()
            .and_then(|row| self.row_id(row))
            .map(String::from)
    }

    /// Moves the cursor down by one row, wrapping to the top.
    pub fn move_selection_down(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected_index = (self.selected_index + 1) % self.rows.len();
        self.details_scroll = 0;
    }

    /// Moves the cursor up by one row, wrapping to the bottom.
    pub fn move_selection_up(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = self.rows.len() - 1;
        } else {
            self.selected_index -= 1;
        }
        self.details_scroll = 0;
    }

    /// Opens or closes the detail pane. Opening needs a test or run under
    /// the cursor; returns whether anything changed.
    pub fn toggle_details(&mut self) -> bool {
        if !self.details_open && self.selected_entry().is_none() {
            return false;
        }
        self.details_open = !self.details_open;
        self.details_scroll = 0;
        true
    }

    pub fn close_details(&mut self) -> bool {
        let was_open = self.details_open;
        self.details_open = false;
        self.details_scroll = 0;
        was_open
    }

    /// Scrolls the open detail pane by one line, stopping at its last line.
    pub fn scroll_details(&mut self, down: bool) -> bool {
        if !self.details_open {
            return false;
        }
        let Some(entry) = self.selected_entry() else {
            return false;
        };
        let last = detail_lines(entry).len().saturating_sub(1);
        let next = if down {
            (self.details_scroll + 1).min(last)
        } else {
            self.details_scroll.saturating_sub(1)
        };
        let changed = next != self.details_scroll;
        self.details_scroll = next;
        changed
    }

    /// Ticks or unticks a status in the status multi-select.
    pub fn toggle_status(&mut self, status: &Status) {
        toggle(&mut self.selection.statuses, status.as_upper());
        self.refresh();
    }

    /// Toggles a filter button. The `all` button turns every other one off.
    pub fn toggle_button(&mut self, label: &str) {
        if label.eq_ignore_ascii_case(ALL_BUTTON) {
            self.selection.buttons.clear();
        } else {
            toggle(&mut self.selection.buttons, &label.to_lowercase());
        }
        self.refresh();
    }

    /// Toggles the selected row's module in the module multi-select.
    ///
    /// Returns `false` when no row is selected.
    pub fn toggle_selected_module(&mut self) -> bool {
        let Some(module) = self
            .selected_row()
            .map(|row| match row {
                RowRef::Module(m) | RowRef::Node(m, _) | RowRef::Run(m, _, _) => m,
            })
            .and_then(|m| self.modules().get(m))
            .map(|module| module.name.clone())
        else {
            return false;
        };

        toggle(&mut self.selection.modules, &module);
        self.refresh();
        true
    }

    /// Clears the module multi-select. Returns whether anything was selected.
    pub fn clear_modules(&mut self) -> bool {
        if self.selection.modules.is_empty() {
            return false;
        }
        self.selection.modules.clear();
        self.refresh();
        true
    }

    pub fn set_search(&mut self, query: String) {
        self.selection.search = query;
        self.refresh();
    }

    /// Clears every filter control. Returns whether any filter was active.
    pub fn reset_filters(&mut self) -> bool {
        if self.selection == Selection::default() {
            return false;
        }
        self.selection = Selection::default();
        self.refresh();
        true
    }

    /// Advances the sort for a sort key press.
    ///
    /// Landing back on the default sort forgets the user's choice, so the
    /// stored value is removed rather than overwritten.
    pub fn cycle_sort(&mut self, field: SortField) {
        let next = self.active_sort().cycle(field, self.default_sort);
        self.sort = (next != self.default_sort).then_some(next);
        self.refresh();
    }

    /// Returns sort and expansion to their load-time defaults.
    pub fn reset_sort_and_expansion(&mut self) {
        self.sort = None;
        self.expanded.clear();
        if let Some(report) = self.report.as_mut() {
            engine::collapse_to_defaults(&mut report.modules);
        }
        self.refresh();
    }

    /// Opens, closes, or flips the selected module or group.
    ///
    /// With `open` set to `Some(false)` on a row that cannot collapse, the
    /// cursor moves to the enclosing row instead. Returns the id and new flag
    /// when a flag changed.
    pub fn set_selected_expanded(&mut self, open: Option<bool>) -> Option<(String, bool)> {
        let row = self.selected_row()?;

        let target = match row {
            RowRef::Module(_) => row,
            RowRef::Node(m, n) => {
                let is_group = matches!(self.modules().get(m)?.nodes.get(n)?, TestNode::Group(_));
                if !is_group {
                    if open == Some(false) {
                        self.select_row(RowRef::Module(m));
                    }
                    return None;
                }
                row
            }
            RowRef::Run(m, n, _) => {
                if open == Some(false) {
                    self.select_row(RowRef::Node(m, n));
                }
                return None;
            }
        };

        let id = self.row_id(target)?.to_string();
        let modules = self.report.as_mut().map(|r| r.modules.as_mut_slice())?;
        let current = engine::is_expanded(modules, &id)?;
        let next = open.unwrap_or(!current);
        if next == current {
            return None;
        }

        engine::set_expanded(modules, &id, next);
        self.expanded.insert(id.clone(), next);
        self.rebuild_rows(Some(&id));
        Some((id, next))
    }

    fn select_row(&mut self, row: RowRef) {
        if let Some(index) = self.rows.iter().position(|r| *r == row) {
            self.selected_index = index;
        }
    }

    /// Reveals the node with `id` and moves the cursor to it.
    ///
    /// Clears the filters if they hide the node and opens its module and,
    /// for a group run, its group. Unknown ids change nothing and return
    /// `None`.
    pub fn navigate_to(&mut self, id: &str) -> Option<Navigation> {
        let _span = tracing::debug_span!("navigate_to", id = %id).entered();

        let report = self.report.as_ref()?;
        let Some(location) = report.locate(id) else {
            tracing::debug!("navigation target not found");
            return None;
        };

        let module = report.modules.get(location.module)?;
        let node = location.node.and_then(|n| module.nodes.get(n));
        let hidden = !module.visible
            || node.is_some_and(|node| !node.is_visible())
            || match (node, location.entry) {
                (Some(TestNode::Group(group)), Some(e)) => {
                    group.entries.get(e).is_some_and(|entry| !entry.visible)
                }
                _ => false,
            };

        let mut ancestors = Vec::new();
        if location.node.is_some() {
            ancestors.push(module.id.clone());
        }
        if let (Some(TestNode::Group(group)), Some(_)) = (node, location.entry) {
            ancestors.push(group.id.clone());
        }

        let mut navigation = Navigation::default();
        if hidden {
            navigation.filters_reset = self.reset_filters();
        }

        if let Some(report) = self.report.as_mut() {
            for ancestor in ancestors {
                if engine::is_expanded(&report.modules, &ancestor) == Some(false) {
                    engine::set_expanded(&mut report.modules, &ancestor, true);
                    self.expanded.insert(ancestor.clone(), true);
                    navigation.opened.push(ancestor);
                }
            }
        }

        self.rebuild_rows(Some(id));
        Some(navigation)
    }

    /// Computes a renderable UI view model from current state and terminal
    /// dimensions.
    ///
    /// # Windowing Algorithm
    ///
    /// 1. Calculate available rows after subtracting UI chrome
    /// 2. Give up to half of them to the detail pane, if it is open
    /// 3. Center the window around the cursor
    /// 4. Shift the window back if it would run past the last row
    #[must_use]
    pub fn compute_viewmodel(&self, rows: usize, cols: usize) -> UIViewModel {
        let empty_state = self.compute_empty_state();
        let available_rows = self.calculate_available_rows(rows).max(1);
        let details = if empty_state.is_none() {
            self.compute_details(available_rows)
        } else {
            None
        };

        let mut footer = self.compute_footer();
        if details.is_some() {
            footer.error = None;
        }

        let base = UIViewModel {
            display_items: vec![],
            selected_index: 0,
            header: self.compute_header(),
            filter_bar: self.compute_filter_bar(),
            footer,
            empty_state,
            search_bar: self.compute_search_bar(),
            details,
        };
        if base.empty_state.is_some() || self.rows.is_empty() {
            return base;
        }

        let available_rows = available_rows
            .saturating_sub(base.details.as_ref().map_or(0, |pane| pane.height))
            .max(1);

        let mut visible_start = self.selected_index.saturating_sub(available_rows / 2);
        let visible_end = (visible_start + available_rows).min(self.rows.len());
        if visible_end - visible_start < available_rows && self.rows.len() >= available_rows {
            visible_start = visible_end.saturating_sub(available_rows);
        }

        let name_width = cols.saturating_sub(FIXED_COLUMNS_WIDTH).max(10);
        let display_items = self.rows[visible_start..visible_end]
            .iter()
            .enumerate()
            .filter_map(|(offset, row)| {
                self.compute_display_item(*row, visible_start + offset == self.selected_index, name_width)
            })
            .collect();

        UIViewModel {
            display_items,
            selected_index: self.selected_index.saturating_sub(visible_start),
            ..base
        }
    }

    fn compute_display_item(&self, row: RowRef, is_selected: bool, name_width: usize) -> Option<DisplayItem> {
        let modules = self.modules();

        let (kind, depth, marker, name, status, detail, duration, started) = match row {
            RowRef::Module(m) => {
                let module = modules.get(m)?;
                let counts = module.counts();
                let detail = format!("{}/{}", counts.passed, counts.total());
                let marker = if module.expanded { "▾" } else { "▸" };
                (RowKind::Module, 0, marker, &module.name, None, detail, String::new(), String::new())
            }
            RowRef::Node(m, n) => match modules.get(m)?.nodes.get(n)? {
                TestNode::Single(entry) => (
                    RowKind::Test,
                    1,
                    "",
                    &entry.name,
                    Some(entry.status.clone()),
                    String::new(),
                    format_duration(entry.duration),
                    format_start_time(entry.start_time),
                ),
                TestNode::Group(group) => (
                    RowKind::Group,
                    1,
                    if group.expanded { "▾" } else { "▸" },
                    &group.name,
                    Some(group.aggregate_status()),
                    format!("×{}", group.entries.len()),
                    format_duration(group.total_duration()),
                    format_start_time(group.earliest_start()),
                ),
            },
            RowRef::Run(m, n, e) => match modules.get(m)?.nodes.get(n)? {
                TestNode::Group(group) => {
                    let entry = group.entries.get(e)?;
                    (
                        RowKind::Run,
                        2,
                        "",
                        &entry.name,
                        Some(entry.status.clone()),
                        String::new(),
                        format_duration(entry.duration),
                        format_start_time(entry.start_time),
                    )
                }
                TestNode::Single(_) => return None,
            },
        };

        let indent = depth * 2 + 2;
        let name = truncate(name, name_width.saturating_sub(indent));
        let highlight_ranges = match kind {
            RowKind::Module => vec![],
            _ => match_ranges(&name, &self.filters.search),
        };

        Some(DisplayItem {
            kind,
            depth,
            marker,
            name,
            status,
            detail,
            duration,
            started,
            is_selected,
            highlight_ranges,
        })
    }

    fn compute_header(&self) -> HeaderInfo {
        let Some(report) = &self.report else {
            return HeaderInfo {
                title: " Test Report ".to_string(),
                summary: String::new(),
            };
        };

        let mut title = report.project.clone().unwrap_or_else(|| "Test Report".to_string());
        if let Some(env) = &report.env {
            title = format!("{title} · {env}");
        }
        if let Some(url) = &report.base_url {
            title = format!("{title} · {url}");
        }
        if !self.report_path.is_empty() {
            title = format!("{title} · {}", display_path(&self.report_path));
        }

        let counts = report.counts();
        let mut summary = format!(
            "{}/{} tests  passed {}  failed {}  broken {}  skipped {}",
            self.outcome.visible_entries,
            counts.total(),
            counts.passed,
            counts.failed,
            counts.broken,
            counts.skipped,
        );
        if let Some(seconds) = report.run_duration() {
            summary = format!("{summary}  in {}", format_duration(Some(seconds)));
        }

        HeaderInfo {
            title: format!(" {title} "),
            summary,
        }
    }

    fn compute_filter_bar(&self) -> FilterBarInfo {
        let mut parts = Vec::new();
        if !self.filters.statuses.is_empty() {
            let statuses: Vec<&str> = self.filters.statuses.iter().map(String::as_str).collect();
            parts.push(format!("status: {}", statuses.join(",")));
        }
        if !self.filters.buttons.is_empty() {
            let buttons: Vec<&str> = self.filters.buttons.iter().map(String::as_str).collect();
            parts.push(format!("only: {}", buttons.join(",")));
        }
        if !self.filters.modules.is_empty() {
            parts.push(format!("modules: {}", self.filters.modules.len()));
        }

        let sort = self.active_sort();
        let arrow = match sort.order {
            engine::SortOrder::Asc => "↑",
            engine::SortOrder::Desc => "↓",
        };
        parts.push(format!("sort: {} {arrow}", sort.field.label()));

        FilterBarInfo { text: parts.join("  ") }
    }

    /// Detail pane for the selected test or run, at most half of
    /// `available_rows` tall. `None` when closed, when the cursor is on a
    /// module or group, or when there is no room for a line of text.
    fn compute_details(&self, available_rows: usize) -> Option<DetailPane> {
        if !self.details_open {
            return None;
        }
        let entry = self.selected_entry()?;
        let lines = detail_lines(entry);

        let height = (lines.len() + 1).min(available_rows / 2);
        if height < 2 {
            return None;
        }
        let body = height - 1;
        let first = self.details_scroll.min(lines.len().saturating_sub(body));
        let more_below = first + body < lines.len();

        Some(DetailPane {
            title: entry.name.clone(),
            lines: lines.into_iter().skip(first).take(body).collect(),
            height,
            more_above: first > 0,
            more_below,
        })
    }

    fn compute_footer(&self) -> FooterInfo {
        let details_shown = self.details_open && self.selected_entry().is_some();
        let keybindings = match self.input_mode {
            InputMode::Search => "Type to filter  Enter: keep query  Esc: clear search".to_string(),
            InputMode::Normal if details_shown => {
                "j/k: move  J/K: scroll details  i/Esc: close details  /: search  q: quit".to_string()
            }
            InputMode::Normal => {
                "j/k: move  Enter: expand/details  i: details  /: search  FBPS/1234/0: status  m/M: module  n/s/d/t: sort  r/R: reset  T: theme  q: quit"
                    .to_string()
            }
        };
        let error = match self.input_mode {
            InputMode::Normal => self
                .selected_error()
                .map(|e| e.lines().next().unwrap_or_default().to_string()),
            InputMode::Search => None,
        };
        FooterInfo { keybindings, error }
    }

    fn compute_empty_state(&self) -> Option<EmptyState> {
        let Some(report) = &self.report else {
            return Some(match &self.load_error {
                Some(error) => EmptyState {
                    message: "Could not load report".to_string(),
                    subtitle: error.clone(),
                    is_error: true,
                },
                None => EmptyState {
                    message: "Loading report...".to_string(),
                    subtitle: display_path(&self.report_path),
                    is_error: false,
                },
            });
        };

        if report.modules.is_empty() {
            return Some(EmptyState {
                message: "This report has no tests".to_string(),
                subtitle: display_path(&self.report_path),
                is_error: false,
            });
        }

        self.outcome.is_empty().then(|| EmptyState {
            message: "No tests match your filters".to_string(),
            subtitle: "Press r to reset filters".to_string(),
            is_error: false,
        })
    }

    fn compute_search_bar(&self) -> Option<SearchBarInfo> {
        let is_editing = self.input_mode == InputMode::Search;
        (is_editing || !self.selection.search.is_empty()).then(|| SearchBarInfo {
            query: self.selection.search.clone(),
            is_editing,
        })
    }

    /// Rows left for the table after the header, summary, filter line,
    /// borders, column headers, footer, and search bar if shown.
    fn calculate_available_rows(&self, total_rows: usize) -> usize {
        let chrome = if self.compute_search_bar().is_some() { 12 } else { 9 };
        total_rows.saturating_sub(chrome)
    }
}

/// Lines of the detail pane for one test, in display order.
fn detail_lines(entry: &Entry) -> Vec<DetailLine> {
    let details = &entry.details;
    let mut lines = Vec::new();

    let mut outcome = entry.status.as_upper().to_string();
    let duration = format_duration(entry.duration);
    if !duration.is_empty() {
        outcome = format!("{outcome}  in {duration}");
    }
    let started = format_start_time(entry.start_time);
    if !started.is_empty() {
        outcome = format!("{outcome}  started {started}");
    }
    push_section(&mut lines, "status", [outcome], false);
    push_section(&mut lines, "id", [entry.id.clone()], false);

    if let Some(description) = &details.description {
        push_section(&mut lines, "description", description.lines().map(String::from), false);
    }
    push_section(
        &mut lines,
        "parameters",
        details.parameters.iter().map(|p| format!("{} = {}", p.name, p.value)),
        false,
    );
    push_section(
        &mut lines,
        "info",
        details.info.iter().map(|(key, value)| format!("{key}: {value}")),
        false,
    );
    push_section(
        &mut lines,
        "links",
        details.links.iter().map(|link| format!("{}: {}", link.label, link.url)),
        false,
    );
    push_section(
        &mut lines,
        "known bugs",
        details.known_bugs.iter().map(|bug| {
            [bug.url.as_deref(), bug.description.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("  ")
        }),
        false,
    );

    let failure = details.traceback.as_deref().or(entry.error.as_deref());
    if let Some(failure) = failure {
        push_section(&mut lines, "error", failure.lines().map(|l| l.replace('\t', "    ")), true);
    }
    lines
}

fn push_section(
    lines: &mut Vec<DetailLine>,
    label: &'static str,
    texts: impl IntoIterator<Item = String>,
    is_error: bool,
) {
    for (i, text) in texts.into_iter().enumerate() {
        lines.push(DetailLine {
            label: if i == 0 { label } else { "" },
            text,
            is_error,
        });
    }
}

/// Flattens visible modules, children, and runs of open groups into rows.
fn flatten(modules: &[Module]) -> Vec<RowRef> {
    let mut rows = Vec::new();
    for (m, module) in modules.iter().enumerate() {
        if !module.visible {
            continue;
        }
        rows.push(RowRef::Module(m));
        if !module.expanded {
            continue;
        }
        for (n, node) in module.nodes.iter().enumerate() {
            if !node.is_visible() {
                continue;
            }
            rows.push(RowRef::Node(m, n));
            if let TestNode::Group(group) = node {
                if group.expanded {
                    rows.extend(
                        group
                            .entries
                            .iter()
                            .enumerate()
                            .filter(|(_, entry)| entry.visible)
                            .map(|(e, _)| RowRef::Run(m, n, e)),
                    );
                }
            }
        }
    }
    rows
}

fn toggle(values: &mut Vec<String>, value: &str) {
    if let Some(index) = values.iter().position(|v| v == value) {
        values.remove(index);
    } else {
        values.push(value.to_string());
    }
}
