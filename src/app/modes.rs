//! Input and appearance mode state types for the application.
//!
//! These types decide which keybindings are active and which built-in theme
//! the dark/light toggle switches to.
//!
//! # State Machine
//!
//! The application operates in one of two input modes:
//! - **Normal**: Navigation, filter toggles, sort keys
//! - **Search**: Every printable key edits the search query live
//!
//! # Example
//!
//! ```rust
//! use reportlens::app::modes::{Appearance, InputMode};
//!
//! let input_mode = InputMode::Search;
//! assert_eq!(Appearance::Dark.flipped(), Appearance::Light);
//! ```

use serde::{Deserialize, Serialize};

/// Current input handling mode.
///
/// Controls which keybindings are active and how user input is processed.
/// Determines the displayed footer text and whether the search bar is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Default navigation and command mode.
    ///
    /// Available keybindings: j/k (navigate), enter/l/h (expand/collapse),
    /// / (search), status and button toggles, sort keys, resets, q (quit).
    Normal,

    /// Search query editing.
    ///
    /// Characters and backspace edit the query and re-filter on every key.
    /// Enter keeps the query, Esc clears it; both return to Normal.
    Search,
}

/// Light or dark palette, flipped by the theme toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    #[default]
    Dark,
    Light,
}

impl Appearance {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}
