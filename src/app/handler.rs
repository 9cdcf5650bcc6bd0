//! Event handling and state transition logic.
//!
//! This module implements the core event handler that processes user input,
//! navigation requests, and worker responses, translating them into state
//! changes and action sequences.
//!
//! # Architecture
//!
//! The handler follows a unidirectional data flow pattern:
//! 1. Events arrive from the plugin runtime or worker thread
//! 2. [`handle_event`] pattern-matches the event type
//! 3. State mutations occur via `AppState` methods, each ending in one
//!    filter/sort pass
//! 4. Every change to filters, sort, or expansion emits a save message for
//!    the worker, so view state survives reloads
//!
//! # Example
//!
//! ```rust
//! use reportlens::app::{handle_event, AppState, Event};
//! use reportlens::engine::SortSpec;
//! use reportlens::ui::Theme;
//!
//! let mut state = AppState::new(Theme::default(), SortSpec::default());
//! let (should_render, actions) = handle_event(&mut state, &Event::KeyDown)?;
//! assert!(should_render);
//! assert!(actions.is_empty());
//! # Ok::<(), reportlens::ReportLensError>(())
//! ```

use crate::app::modes::InputMode;
use crate::app::state::Navigation;
use crate::app::{Action, AppState};
use crate::domain::error::Result;
use crate::domain::Status;
use crate::engine::SortField;
use crate::worker::{WorkerMessage, WorkerResponse};

/// Events triggered by user input, navigation requests, or worker responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Moves the cursor down by one row (wraps to top).
    KeyDown,
    /// Moves the cursor up by one row (wraps to bottom).
    KeyUp,
    /// Closes the floating pane and hides the plugin UI.
    CloseFocus,

    /// Flips the selected module or group open or closed. On a test or run
    /// it opens or closes the detail pane instead.
    ToggleExpand,
    /// Opens the selected module or group.
    Expand,
    /// Closes the selected module or group, or moves to the enclosing row.
    Collapse,

    /// Opens or closes the detail pane for the selected test or run.
    ToggleDetails,
    /// Scrolls the detail pane one line down.
    DetailsDown,
    /// Scrolls the detail pane one line up.
    DetailsUp,

    /// Enters search mode, keeping the current query.
    SearchMode,
    /// Appends a character to the search query.
    Char(char),
    /// Removes the last character from the search query.
    Backspace,
    /// Leaves search mode and keeps the query.
    ConfirmSearch,
    /// Closes the detail pane, or leaves search mode and clears the query.
    Escape,

    /// Ticks or unticks a status in the status multi-select.
    ToggleStatus(Status),
    /// Toggles a filter button by label (`passed`, `failed`, ..., `all`).
    ToggleButton(String),
    /// Toggles the selected row's module in the module multi-select.
    ToggleModule,
    /// Clears the module multi-select.
    ClearModules,
    /// Clears every filter control.
    ResetFilters,

    /// Sort key press: a new field sorts ascending, the same field flips,
    /// a third press returns to the default.
    Sort(SortField),
    /// Returns sort and expansion to their defaults.
    ResetView,

    /// Switches between the dark and light built-in themes.
    ToggleTheme,

    /// Reveals a node by id and moves the cursor to it.
    Navigate(String),

    /// Wraps a response from the background worker thread.
    WorkerResponse(WorkerResponse),
}

/// Processes an event, mutates application state, and returns actions to execute.
///
/// Returns whether the UI should re-render, and the actions to execute in
/// sequence.
///
/// # Errors
///
/// Reserved for failures in state transitions; the current events are all
/// infallible.
///
/// # Tracing
///
/// Each call creates a debug-level span with the event type.
#[allow(clippy::too_many_lines)]
pub fn handle_event(state: &mut AppState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = ?event).entered();

    match event {
        Event::KeyDown => {
            state.move_selection_down();
            Ok((true, vec![]))
        }
        Event::KeyUp => {
            state.move_selection_up();
            Ok((true, vec![]))
        }
        Event::CloseFocus => Ok((false, vec![Action::CloseFocus])),

        Event::ToggleExpand => {
            if state.selected_entry().is_some() {
                return Ok((state.toggle_details(), vec![]));
            }
            Ok(expansion_changed(state.set_selected_expanded(None)))
        }
        Event::Expand => Ok(expansion_changed(state.set_selected_expanded(Some(true)))),
        Event::Collapse => Ok(expansion_changed(state.set_selected_expanded(Some(false)))),

        Event::ToggleDetails => {
            let changed = state.toggle_details();
            tracing::debug!(open = state.details_open, changed = changed, "detail pane toggled");
            Ok((changed, vec![]))
        }
        Event::DetailsDown => Ok((state.scroll_details(true), vec![])),
        Event::DetailsUp => Ok((state.scroll_details(false), vec![])),

        Event::SearchMode => {
            tracing::debug!("entering search mode");
            state.input_mode = InputMode::Search;
            Ok((true, vec![]))
        }
        Event::Char(c) => {
            if state.input_mode != InputMode::Search {
                return Ok((false, vec![]));
            }

            let mut query = state.selection.search.clone();
            query.push(*c);
            tracing::trace!(query = %query, char = %c, "search query updated");
            state.set_search(query);

            Ok((true, save_filters(state)))
        }
        Event::Backspace => {
            if state.input_mode != InputMode::Search {
                return Ok((false, vec![]));
            }

            let mut query = state.selection.search.clone();
            if query.pop().is_none() {
                return Ok((false, vec![]));
            }
            state.set_search(query);

            Ok((true, save_filters(state)))
        }
        Event::ConfirmSearch => {
            tracing::debug!(query = %state.selection.search, "keeping search query");
            state.input_mode = InputMode::Normal;
            Ok((true, vec![]))
        }
        Event::Escape => {
            if state.input_mode == InputMode::Normal && state.close_details() {
                return Ok((true, vec![]));
            }
            let was_searching = state.input_mode == InputMode::Search;
            state.input_mode = InputMode::Normal;

            if state.selection.search.is_empty() {
                return Ok((was_searching, vec![]));
            }
            tracing::debug!(query = %state.selection.search, "clearing search query");
            state.set_search(String::new());
            Ok((true, save_filters(state)))
        }

        Event::ToggleStatus(status) => {
            state.toggle_status(status);
            Ok((true, save_filters(state)))
        }
        Event::ToggleButton(label) => {
            state.toggle_button(label);
            Ok((true, save_filters(state)))
        }
        Event::ToggleModule => {
            if state.toggle_selected_module() {
                Ok((true, save_filters(state)))
            } else {
                Ok((false, vec![]))
            }
        }
        Event::ClearModules => {
            if state.clear_modules() {
                Ok((true, save_filters(state)))
            } else {
                Ok((false, vec![]))
            }
        }
        Event::ResetFilters => {
            if state.reset_filters() {
                tracing::debug!("filters reset");
                Ok((true, save_filters(state)))
            } else {
                Ok((false, vec![]))
            }
        }

        Event::Sort(field) => {
            state.cycle_sort(*field);
            tracing::debug!(sort = %state.active_sort(), user_choice = state.sort.is_some(), "sort changed");
            Ok((true, vec![Action::PostToWorker(WorkerMessage::save_sort(state.sort))]))
        }
        Event::ResetView => {
            state.reset_sort_and_expansion();
            Ok((
                true,
                vec![
                    Action::PostToWorker(WorkerMessage::save_sort(None)),
                    Action::PostToWorker(WorkerMessage::clear_expanded()),
                ],
            ))
        }

        Event::ToggleTheme => {
            state.theme = state.theme.toggled();
            tracing::debug!(theme = %state.theme.name, "theme toggled");
            Ok((true, vec![]))
        }

        Event::Navigate(id) => {
            if state.report.is_none() {
                tracing::debug!(id = %id, "report not loaded, deferring navigation");
                state.pending_focus = Some(id.clone());
                return Ok((false, vec![]));
            }
            let navigation = state.navigate_to(id);
            Ok(navigated(state, navigation))
        }

        Event::WorkerResponse(response) => handle_worker_response(state, response),
    }
}

fn handle_worker_response(state: &mut AppState, response: &WorkerResponse) -> Result<(bool, Vec<Action>)> {
    match response {
        WorkerResponse::ReportLoaded { path, report } => {
            tracing::debug!(
                path = %path,
                module_count = report.modules.len(),
                "report received"
            );
            state.set_report(report.clone());

            match state.pending_focus.take() {
                Some(id) => {
                    let navigation = state.navigate_to(&id);
                    let (_, actions) = navigated(state, navigation);
                    Ok((true, actions))
                }
                None => Ok((true, vec![])),
            }
        }
        WorkerResponse::ReportFailed { path, message } => {
            tracing::warn!(path = %path, error = %message, "report failed to load");
            state.load_error = Some(message.clone());
            Ok((true, vec![]))
        }
        WorkerResponse::StateLoaded { view } => {
            if state.state_restored {
                tracing::debug!("view state already restored, ignoring");
                return Ok((false, vec![]));
            }
            state.restore_view(view.clone());
            Ok((true, vec![]))
        }
        WorkerResponse::Saved { key } => {
            tracing::trace!(key = %key, "view state saved");
            Ok((false, vec![]))
        }
        WorkerResponse::Error { message } => {
            tracing::error!("Worker error: {}", message);
            Ok((false, vec![]))
        }
    }
}

fn save_filters(state: &AppState) -> Vec<Action> {
    vec![Action::PostToWorker(WorkerMessage::save_filters(state.filters.clone()))]
}

fn expansion_changed(changed: Option<(String, bool)>) -> (bool, Vec<Action>) {
    match changed {
        Some((id, open)) => {
            tracing::debug!(id = %id, open = open, "expansion changed");
            (true, vec![Action::PostToWorker(WorkerMessage::set_expanded(id, open))])
        }
        // The cursor may still have moved to a parent row.
        None => (true, vec![]),
    }
}

fn navigated(state: &AppState, navigation: Option<Navigation>) -> (bool, Vec<Action>) {
    let Some(navigation) = navigation else {
        return (false, vec![]);
    };

    let mut actions = Vec::new();
    if navigation.filters_reset {
        actions.extend(save_filters(state));
    }
    actions.extend(
        navigation
            .opened
            .into_iter()
            .map(|id| Action::PostToWorker(WorkerMessage::set_expanded(id, true))),
    );
    (true, actions)
}
