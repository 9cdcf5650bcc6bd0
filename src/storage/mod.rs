//! Storage layer for persisted view state.
//!
//! This module provides the key/value storage abstraction and the fail-soft
//! view-state layer that keeps the active filters, sort, and expansion flags
//! across reloads.
//!
//! # Modules
//!
//! - `backend`: Storage trait abstraction for backend implementations
//! - `json`: JSON file-based storage implementation
//! - `memory`: In-memory storage for session-scoped state
//! - `view_state`: Filters, sort, and expansion records on top of a backend

pub mod backend;
pub mod json;
pub mod memory;
pub mod view_state;

pub use backend::Storage;
pub use json::JsonStorage;
pub use memory::MemoryStorage;
pub use view_state::{
    open_storage, PersistedView, StateScope, ViewState, EXPANDED_KEY, FILTERS_KEY, SORT_KEY,
};
