//! Reportlens: A Zellij plugin for browsing test-run reports.
//!
//! Reportlens shows the JSON report written by a test logger as a collapsible
//! module → test tree and provides:
//! - Live text search over test names
//! - Status multi-select and quick status buttons
//! - Module multi-select
//! - Sorting by name, status, duration, or start time
//! - Persisted filters, sort, and expanded rows, restored on the next load
//! - Asynchronous file I/O via a Zellij worker thread

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Zellij Plugin Shim (main.rs)                       │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← State machine
//! │  - Event handling                                   │
//! │  - Action dispatching                               │
//! │  - View model computation                           │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Engine        │   │ Worker Layer  │
//! │ (ui/)         │   │ (engine/)     │   │ (worker/)     │
//! │ - Rendering   │   │ - Filters     │   │ - Report I/O  │
//! │ - Theming     │   │ - Sorting     │   │ - View state  │
//! │ - Components  │   │ - Expansion   │   │ - IPC bridge  │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Storage, Infrastructure & Domain Layers            │
//! │  - Key/value stores and view state (storage/)       │
//! │  - Platform paths (infrastructure/)                 │
//! │  - Report model and errors (domain/)                │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │  ← Optional
//! │  - OpenTelemetry tracing                            │
//! │  - Rotating JSON line export                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Application state machine with event/action model
//! - [`domain`]: Report tree, statuses, errors
//! - [`engine`]: Filter normalization and matching, sorting, expansion
//! - [`infrastructure`]: Platform-specific utilities (paths)
//! - [`storage`]: Key/value backends and the view state built on them
//! - [`worker`]: Background worker for report loading and state writes
//! - [`ui`]: Terminal rendering with theme support
//! - `observability`: OpenTelemetry tracing (internal)
//!
//! # Configuration
//!
//! ```kdl
//! pane {
//!     plugin location="file:/path/to/reportlens.wasm" {
//!         report_path "~/logs/blog_report.json"
//!         theme "catppuccin-mocha"
//!         state_scope "persistent"
//!         default_sort "starttime_asc"
//!         trace_level "info"
//!     }
//! }
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Plugin Load** (`main.rs`): parse configuration, create `AppState`
//!    with theme and default sort, subscribe to Zellij events.
//! 2. **Permissions Granted**: post `LoadState` and `LoadReport` to the worker.
//! 3. **Worker Processing**: open the view state store, read and parse the
//!    report, answer with `StateLoaded` and `ReportLoaded`.
//! 4. **Refresh**: normalize the selection, filter and sort the tree, rebuild
//!    the visible rows. Every later filter, sort, or expansion change is
//!    written back through the worker.
//!
//! # Example
//!
//! ```rust
//! use reportlens::{initialize, handle_event, Config, Event};
//!
//! let config = Config::default();
//! let mut state = initialize(&config);
//!
//! for event in [Event::SearchMode, Event::Char('x'), Event::ConfirmSearch] {
//!     let (_render, _actions) = handle_event(&mut state, &event)?;
//! }
//! assert_eq!(state.filters.search, "x");
//! # Ok::<(), reportlens::ReportLensError>(())
//! ```

pub mod app;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod storage;
pub mod worker;

pub mod ui;

pub mod observability;

pub use app::{handle_event, Action, AppState, Event, InputMode};
pub use domain::{Report, ReportLensError, Result};
pub use ui::Theme;

use engine::SortSpec;
use std::collections::BTreeMap;
use storage::StateScope;

/// Report path used when none is configured.
pub const DEFAULT_REPORT_PATH: &str = "~/logs/blog_report.json";

/// Plugin configuration parsed from Zellij's configuration system.
///
/// # Example
///
/// ```kdl
/// plugin location="file:/path/to/reportlens.wasm" {
///     report_path "~/ci/report.json"
///     theme_file "/path/to/theme.toml"
///     state_scope "session"
///     default_sort "duration_desc"
///     focus "tests/test_cart.py::test_add"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the report JSON. A leading `~` is resolved against the
    /// plugin's host directory. Default: `~/logs/blog_report.json`
    pub report_path: String,

    /// Built-in theme name to use.
    ///
    /// Options: `catppuccin-mocha`, `catppuccin-latte`. Ignored if
    /// `theme_file` is set.
    pub theme_name: Option<String>,

    /// Path to a custom TOML theme file.
    ///
    /// Takes precedence over `theme_name`. See [`ui::theme`] for format.
    pub theme_file: Option<String>,

    /// `EnvFilter` directive for traces. Default: `"info"`
    pub trace_level: String,

    /// Where view state is kept. Default: persistent JSON file.
    pub state_scope: StateScope,

    /// Sort used when none has been saved. Default: start time ascending.
    pub default_sort: SortSpec,

    /// Test id to navigate to once the report is loaded.
    pub focus: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_path: DEFAULT_REPORT_PATH.to_string(),
            theme_name: None,
            theme_file: None,
            trace_level: "info".to_string(),
            state_scope: StateScope::default(),
            default_sort: SortSpec::default(),
            focus: None,
        }
    }
}

impl Config {
    /// Parses configuration from Zellij's configuration map.
    ///
    /// # Parsing Rules
    ///
    /// - `report_path`: blank values fall back to the default
    /// - `theme`, `theme_file`, `focus`: taken verbatim when non-blank
    /// - `trace_level`: String, defaults to `info`
    /// - `state_scope`: `persistent`/`local` or `session`; unknown values
    ///   fall back to `persistent`
    /// - `default_sort`: `field_order`, e.g. `name_asc`; unparsable values
    ///   fall back to `starttime_asc`
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use reportlens::Config;
    /// use reportlens::storage::StateScope;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("report_path".to_string(), "~/ci/report.json".to_string());
    /// map.insert("state_scope".to_string(), "session".to_string());
    ///
    /// let config = Config::from_zellij(&map);
    /// assert_eq!(config.report_path, "~/ci/report.json");
    /// assert_eq!(config.state_scope, StateScope::Session);
    /// ```
    #[must_use]
    pub fn from_zellij(config: &BTreeMap<String, String>) -> Self {
        let text = |key: &str| {
            config
                .get(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let state_scope = text("state_scope")
            .map_or_else(StateScope::default, |raw| {
                StateScope::parse(&raw).unwrap_or_else(|| {
                    tracing::debug!(state_scope = %raw, "unknown state scope, using default");
                    StateScope::default()
                })
            });

        let default_sort = text("default_sort").map_or_else(SortSpec::default, |raw| {
            raw.parse::<SortSpec>().unwrap_or_else(|e| {
                tracing::debug!(default_sort = %raw, error = %e, "invalid default sort, using default");
                SortSpec::default()
            })
        });

        Self {
            report_path: text("report_path").unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string()),
            theme_name: text("theme"),
            theme_file: text("theme_file"),
            trace_level: text("trace_level").unwrap_or_else(|| "info".to_string()),
            state_scope,
            default_sort,
            focus: text("focus"),
        }
    }
}

/// Initializes the plugin with configuration.
///
/// Creates a new `AppState` with:
/// - Loaded theme (from file, name, or default)
/// - The configured default sort and report path
/// - A pending focus target, applied when the report arrives
/// - No report (populated later by the worker)
pub fn initialize(config: &Config) -> AppState {
    tracing::debug!("initializing reportlens plugin");

    let theme = config.theme_file.as_ref().map_or_else(
        || {
            config.theme_name.as_ref().map_or_else(
                Theme::default,
                |theme_name| {
                    Theme::from_name(theme_name).unwrap_or_else(|| {
                        tracing::debug!(theme_name = %theme_name, "failed to load theme, using default");
                        Theme::default()
                    })
                },
            )
        },
        |theme_file| {
            Theme::from_file(infrastructure::paths::expand_tilde(theme_file)).unwrap_or_else(|e| {
                tracing::debug!(theme_file = %theme_file, error = %e, "failed to load theme from file, using default");
                Theme::default()
            })
        },
    );

    let mut state = AppState::new(theme, config.default_sort);
    state.report_path.clone_from(&config.report_path);
    state.pending_focus.clone_from(&config.focus);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SortField, SortOrder};

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn empty_configuration_uses_defaults() {
        let config = Config::from_zellij(&BTreeMap::new());
        assert_eq!(config.report_path, DEFAULT_REPORT_PATH);
        assert_eq!(config.trace_level, "info");
        assert_eq!(config.state_scope, StateScope::Persistent);
        assert_eq!(config.default_sort, SortSpec::default());
        assert!(config.focus.is_none());
    }

    #[test]
    fn typed_values_are_parsed() {
        let config = Config::from_zellij(&map(&[
            ("default_sort", "duration_desc"),
            ("state_scope", "session"),
            ("focus", " t-1 "),
            ("theme", "catppuccin-latte"),
        ]));
        assert_eq!(config.default_sort.field, SortField::Duration);
        assert_eq!(config.default_sort.order, SortOrder::Desc);
        assert_eq!(config.state_scope, StateScope::Session);
        assert_eq!(config.focus.as_deref(), Some("t-1"));
        assert_eq!(config.theme_name.as_deref(), Some("catppuccin-latte"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = Config::from_zellij(&map(&[
            ("default_sort", "speed_up"),
            ("state_scope", "cloud"),
            ("report_path", "  "),
        ]));
        assert_eq!(config.default_sort, SortSpec::default());
        assert_eq!(config.state_scope, StateScope::Persistent);
        assert_eq!(config.report_path, DEFAULT_REPORT_PATH);
    }

    #[test]
    fn initialize_carries_config_into_state() {
        let config = Config {
            theme_name: Some("catppuccin-latte".to_string()),
            focus: Some("t-9".to_string()),
            ..Config::default()
        };
        let state = initialize(&config);
        assert_eq!(state.theme.name, "catppuccin-latte");
        assert_eq!(state.report_path, DEFAULT_REPORT_PATH);
        assert_eq!(state.pending_focus.as_deref(), Some("t-9"));
        assert!(state.report.is_none());
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let config = Config {
            theme_name: Some("no-such-theme".to_string()),
            ..Config::default()
        };
        assert_eq!(initialize(&config).theme, Theme::default());
    }
}
