//! Filter/sort engine.
//!
//! Pure functions over the in-memory report tree. Nothing here performs I/O;
//! the app layer calls [`apply`] after every control change and persists the
//! resulting specs through the storage layer.
//!
//! # Organization
//!
//! - [`filter`]: [`Selection`] → [`FilterSpec`] normalization and entry matching
//! - [`sort`]: [`SortSpec`] and the sibling comparator
//! - [`apply`](mod@apply): one visibility and ordering pass over all modules
//! - [`expand`]: per-id expansion flags

pub mod apply;
pub mod expand;
pub mod filter;
pub mod sort;

pub use apply::{apply, ApplyOutcome};
pub use expand::{collapse_to_defaults, is_expanded, restore_expanded, set_expanded};
pub use filter::{matches, normalize, FilterSpec, Selection, ALL_BUTTON};
pub use sort::{compare, ParseSortError, SortField, SortKey, SortOrder, SortSpec};
