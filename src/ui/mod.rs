//! User interface rendering layer with component-based architecture.
//!
//! ```text
//! AppState → compute_viewmodel → UIViewModel → render → ANSI Output
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: View model types representing renderable UI state
//! - [`renderer`]: Top-level rendering coordinator
//! - `components`: Header, table, search bar, empty state, footer
//! - [`helpers`]: Cursor positioning, match highlighting, text formatting
//! - [`theme`]: Color scheme definitions and ANSI escape sequence generation

mod components;
pub mod helpers;
pub mod renderer;
pub mod theme;
pub mod viewmodel;

pub use renderer::render;
pub use theme::Theme;
pub use viewmodel::{
    DisplayItem, EmptyState, FilterBarInfo, FooterInfo, HeaderInfo, RowKind, SearchBarInfo,
    UIViewModel,
};
