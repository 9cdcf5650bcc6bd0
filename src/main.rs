//! Zellij plugin wrapper and entry point.
//!
//! This module provides the thin integration layer between the reportlens
//! library and the Zellij plugin system. It implements the `ZellijPlugin` and
//! `ZellijWorker` traits to handle Zellij events and lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │   Zellij Main Thread    │
//! │  ┌──────────────────┐   │
//! │  │  State (plugin)  │   │  ← UI state, event handling
//! │  └──────────────────┘   │
//! │          │              │
//! │          │ IPC          │
//! │          ▼              │
//! │  ┌──────────────────┐   │
//! │  │  PluginWorker    │   │  ← Report parsing
//! │  │ (worker thread)  │   │  ← View state storage
//! │  └──────────────────┘   │
//! └─────────────────────────┘
//! ```
//!
//! # Plugin Lifecycle
//!
//! 1. **Load**: Parse config, initialize tracing, create `AppState`
//! 2. **Subscribe**: Register for Key, `CustomMessage`, permission events
//! 3. **Permissions granted**: ask the worker for view state and the report
//! 4. **Update**: Handle events, delegate to library layer
//! 5. **Pipe**: `goto:<id>` messages navigate to a test
//! 6. **Render**: Call library render function
//!
//! # Keybindings
//!
//! In normal mode:
//! - `j`/`Down`, `k`/`Up`: Move
//! - `Enter`: Expand or collapse, `l`: expand, `h`: collapse
//! - `/`: Search
//! - `F` `B` `P` `S`: Toggle failed/broken/passed/skipped in the status filter
//! - `1`-`4`: Toggle the passed/failed/broken/skipped buttons, `0`: all
//! - `m`: Toggle the selected row's module, `M`: clear modules
//! - `n` `s` `d` `t`: Sort by name/status/duration/start time
//! - `r`: Reset filters, `R`: reset sort and expansion
//! - `T`: Toggle dark/light theme
//! - `q`: Close plugin
//!
//! In search mode:
//! - Characters and `Backspace` edit the query
//! - `Enter`: Keep the query, `Esc`: clear it

#![allow(clippy::multiple_crate_versions)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zellij_tile::prelude::*;
use zellij_tile::shim::{post_message_to, post_message_to_plugin};

use reportlens::domain::Status;
use reportlens::engine::SortField;
use reportlens::infrastructure::expand_tilde;
use reportlens::storage::StateScope;
use reportlens::worker::{ReportWorker, WorkerMessage, WorkerResponse, WORKER_NAME};
use reportlens::{handle_event, Action, Config, Event, InputMode};

// Register plugin and worker with Zellij
register_plugin!(State);
register_worker!(PluginWorker, reportlens_worker, REPORTLENS_WORKER);

/// Pipe payload prefix for navigation requests.
const GOTO_PREFIX: &str = "goto:";

/// Plugin state wrapper.
///
/// Wraps the library's `AppState` with Zellij-specific concerns like worker
/// communication.
struct State {
    /// Core application state from library layer.
    app: reportlens::app::AppState,

    /// Worker thread identifier for IPC messaging.
    worker_name: String,

    /// Backend requested for view state.
    state_scope: StateScope,
}

impl Default for State {
    fn default() -> Self {
        let default_config = Config::default();
        Self {
            app: reportlens::initialize(&default_config),
            worker_name: WORKER_NAME.to_string(),
            state_scope: default_config.state_scope,
        }
    }
}

impl ZellijPlugin for State {
    /// Initializes the plugin on load.
    ///
    /// # Permissions
    ///
    /// - `ReadApplicationState`: Receive worker and pipe messages
    /// - `FullHdAccess`: Read the report and write view state
    /// - `ReadCliPipes`: Accept `goto:<id>` from `zellij pipe`
    fn load(&mut self, configuration: BTreeMap<String, String>) {
        let config = Config::from_zellij(&configuration);
        reportlens::observability::init_tracing(&config);

        let span = tracing::debug_span!("plugin_load");
        let _guard = span.entered();

        tracing::debug!(
            report_path = %config.report_path,
            state_scope = ?config.state_scope,
            default_sort = %config.default_sort,
            "parsed configuration"
        );
        self.app = reportlens::initialize(&config);
        self.state_scope = config.state_scope;

        request_permission(&[
            PermissionType::ReadApplicationState,
            PermissionType::FullHdAccess,
            PermissionType::ReadCliPipes,
        ]);

        subscribe(&[
            EventType::Key,
            EventType::CustomMessage,
            EventType::PermissionRequestResult,
        ]);

        tracing::debug!("plugin load complete - waiting for permissions");
    }

    /// Handles incoming Zellij events.
    ///
    /// Returns `true` if the UI should re-render.
    fn update(&mut self, event: zellij_tile::prelude::Event) -> bool {
        let event_name = Self::get_event_name(&event);
        let span_name = format!("plugin_update::{event_name}");
        let span = tracing::debug_span!("plugin_update_event", otel.name = %span_name, event_type = %event_name);
        let _guard = span.entered();

        let our_event = match event {
            zellij_tile::prelude::Event::Key(ref key) => match self.map_key_event(key) {
                Some(event) => event,
                None => return false,
            },
            zellij_tile::prelude::Event::CustomMessage(message, payload) => {
                match self.map_custom_message_event(&message, &payload) {
                    Some(event) => event,
                    None => return false,
                }
            }
            zellij_tile::prelude::Event::PermissionRequestResult(permissions) => {
                self.handle_permission_result(permissions);
                return false;
            }
            _ => return false,
        };

        self.dispatch(&our_event)
    }

    /// Handles `goto:<id>` pipe messages.
    fn pipe(&mut self, pipe_message: PipeMessage) -> bool {
        if pipe_message.name != WORKER_NAME {
            return false;
        }
        let Some(payload) = pipe_message.payload else {
            return false;
        };
        match payload.trim().strip_prefix(GOTO_PREFIX) {
            Some(id) if !id.is_empty() => {
                tracing::debug!(id = %id, "navigation requested over pipe");
                self.dispatch(&Event::Navigate(id.to_string()))
            }
            _ => {
                tracing::debug!(payload = %payload, "ignoring unknown pipe payload");
                false
            }
        }
    }

    /// Renders the plugin UI.
    fn render(&mut self, rows: usize, cols: usize) {
        reportlens::ui::render(&self.app, rows, cols);
    }
}

impl State {
    /// Runs a library event and executes the resulting actions.
    fn dispatch(&mut self, event: &Event) -> bool {
        match handle_event(&mut self.app, event) {
            Ok((should_render, actions)) => {
                tracing::debug!(
                    action_count = actions.len(),
                    should_render = should_render,
                    "event handled successfully"
                );
                for a in actions {
                    self.execute_action(&a);
                }
                should_render
            }
            Err(e) => {
                tracing::debug!(error = %e, "error handling event");
                false
            }
        }
    }

    /// Gets a string name for a Zellij event for logging purposes.
    fn get_event_name(event: &zellij_tile::prelude::Event) -> String {
        match event {
            zellij_tile::prelude::Event::Key(key) => format!("Key({:?})", key.bare_key),
            zellij_tile::prelude::Event::CustomMessage(msg, _) => format!("CustomMessage({msg})"),
            zellij_tile::prelude::Event::PermissionRequestResult(..) => {
                "PermissionRequestResult".to_string()
            }
            _ => "Other".to_string(),
        }
    }

    /// Maps keyboard events to application events.
    fn map_key_event(&self, key: &KeyWithModifier) -> Option<Event> {
        tracing::debug!(bare_key = ?key.bare_key, "key event");

        if self.app.input_mode == InputMode::Search {
            return Some(match key.bare_key {
                BareKey::Down => Event::KeyDown,
                BareKey::Up => Event::KeyUp,
                BareKey::Enter => Event::ConfirmSearch,
                BareKey::Esc => Event::Escape,
                BareKey::Backspace => Event::Backspace,
                BareKey::Char(c) => Event::Char(c),
                _ => return None,
            });
        }

        Some(match key.bare_key {
            BareKey::Down | BareKey::Char('j') => Event::KeyDown,
            BareKey::Up | BareKey::Char('k') => Event::KeyUp,
            BareKey::Enter => Event::ToggleExpand,
            BareKey::Right | BareKey::Char('l') => Event::Expand,
            BareKey::Left | BareKey::Char('h') => Event::Collapse,
            BareKey::Esc => Event::Escape,
            BareKey::Char('i') => Event::ToggleDetails,
            BareKey::PageDown | BareKey::Char('J') => Event::DetailsDown,
            BareKey::PageUp | BareKey::Char('K') => Event::DetailsUp,
            BareKey::Char('/') => Event::SearchMode,
            BareKey::Char('F') => Event::ToggleStatus(Status::Failed),
            BareKey::Char('B') => Event::ToggleStatus(Status::Broken),
            BareKey::Char('P') => Event::ToggleStatus(Status::Passed),
            BareKey::Char('S') => Event::ToggleStatus(Status::Skipped),
            BareKey::Char('1') => Event::ToggleButton("passed".to_string()),
            BareKey::Char('2') => Event::ToggleButton("failed".to_string()),
            BareKey::Char('3') => Event::ToggleButton("broken".to_string()),
            BareKey::Char('4') => Event::ToggleButton("skipped".to_string()),
            BareKey::Char('0') => Event::ToggleButton("all".to_string()),
            BareKey::Char('m') => Event::ToggleModule,
            BareKey::Char('M') => Event::ClearModules,
            BareKey::Char('n') => Event::Sort(SortField::Name),
            BareKey::Char('s') => Event::Sort(SortField::Status),
            BareKey::Char('d') => Event::Sort(SortField::Duration),
            BareKey::Char('t') => Event::Sort(SortField::StartTime),
            BareKey::Char('r') => Event::ResetFilters,
            BareKey::Char('R') => Event::ResetView,
            BareKey::Char('T') => Event::ToggleTheme,
            BareKey::Char('q') => Event::CloseFocus,
            _ => return None,
        })
    }

    /// Handles permission request results.
    fn handle_permission_result(&self, permissions: PermissionStatus) {
        match permissions {
            PermissionStatus::Granted => {
                tracing::debug!("permissions granted - loading view state and report");
                self.post_worker_message(&WorkerMessage::load_state(self.state_scope));
                self.post_worker_message(&WorkerMessage::load_report(expand_tilde(
                    &self.app.report_path,
                )));
            }
            PermissionStatus::Denied => {
                tracing::warn!("permissions denied - report cannot be read");
            }
        }
    }

    /// Maps custom message events to application events.
    fn map_custom_message_event(&self, message: &str, payload: &str) -> Option<Event> {
        tracing::debug!(message_name = %message, payload_len = payload.len(), "custom message event");

        if message == self.worker_name {
            match serde_json::from_str::<WorkerResponse>(payload) {
                Ok(response) => Some(Event::WorkerResponse(response)),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to deserialize worker response");
                    None
                }
            }
        } else {
            tracing::debug!(message_name = %message, "ignoring custom message with unknown name");
            None
        }
    }

    /// Posts a message to the worker thread.
    ///
    /// Serialization errors are logged, not propagated.
    fn post_worker_message(&self, message: &WorkerMessage) {
        match serde_json::to_string(&message) {
            Ok(payload) => {
                tracing::debug!(kind = message.kind(), payload_len = payload.len(), "posting message to worker");
                post_message_to(PluginMessage {
                    worker_name: Some(self.worker_name.clone()),
                    name: self.worker_name.clone(),
                    payload,
                });
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to serialize worker message");
            }
        }
    }

    /// Executes an action returned from event handling.
    #[tracing::instrument(level = "debug", skip(self))]
    fn execute_action(&self, action: &Action) {
        match action {
            Action::CloseFocus => {
                tracing::debug!("closing plugin focus");
                hide_self();
            }
            Action::PostToWorker(ref message) => {
                self.post_worker_message(message);
            }
        }
    }
}

/// Tracks whether worker tracing has been initialized.
static WORKER_TRACING_INITIALIZED: std::sync::atomic::AtomicBool =
    std::sync::atomic::AtomicBool::new(false);

/// Zellij-facing wrapper around [`ReportWorker`].
///
/// Zellij constructs workers through `Default` and requires them to be
/// serde-compatible; the inner worker carries open stores and is skipped.
#[derive(Serialize, Deserialize, Default)]
struct PluginWorker {
    #[serde(skip)]
    inner: ReportWorker,
}

impl ZellijWorker<'_> for PluginWorker {
    /// Decodes the payload, handles it, and posts the response back under
    /// the worker's message name.
    fn on_message(&mut self, message: String, payload: String) {
        if !WORKER_TRACING_INITIALIZED.swap(true, std::sync::atomic::Ordering::Relaxed) {
            reportlens::observability::init_tracing(&Config::default());
        }

        tracing::debug!(message_name = %message, payload_len = payload.len(), "worker message received");

        if let Some(payload) = self.inner.handle_payload(&payload) {
            post_message_to_plugin(PluginMessage {
                name: WORKER_NAME.to_string(),
                payload,
                worker_name: None,
            });
        }
    }
}
