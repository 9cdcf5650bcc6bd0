//! Persisted view state: filters, sort, and expansion flags.
//!
//! Three fixed keys hold JSON text:
//!
//! | key             | value                                          |
//! |-----------------|------------------------------------------------|
//! | `filters`       | `{"search", "status": [], "module": [], "buttons": []}` |
//! | `sort`          | `"field_order"`                                |
//! | `expandedTests` | `{"<id>": bool}`                               |
//!
//! Every operation is fail-soft. Backend errors and malformed stored JSON are
//! logged and otherwise treated as "nothing stored"; callers never see an
//! error from this layer.

use crate::engine::{FilterSpec, SortSpec};
use crate::storage::backend::Storage;
use crate::storage::json::JsonStorage;
use crate::storage::memory::MemoryStorage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const FILTERS_KEY: &str = "filters";
pub const SORT_KEY: &str = "sort";
pub const EXPANDED_KEY: &str = "expandedTests";

/// How long view state lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateScope {
    /// Written to a JSON file, survives Zellij restarts.
    #[default]
    Persistent,
    /// Kept in worker memory for the current session only.
    Session,
}

impl StateScope {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "persistent" | "local" => Some(Self::Persistent),
            "session" => Some(Self::Session),
            _ => None,
        }
    }
}

/// Opens the backend for `scope`.
///
/// A persistent store that cannot be opened falls back to memory so the
/// viewer keeps working without persistence.
#[must_use]
pub fn open_storage(scope: StateScope, path: PathBuf) -> Box<dyn Storage> {
    match scope {
        StateScope::Session => Box::new(MemoryStorage::default()),
        StateScope::Persistent => match JsonStorage::open_or_reset(path) {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                tracing::warn!(error = %e, "persistent view state unavailable, using memory");
                Box::new(MemoryStorage::default())
            }
        },
    }
}

/// Everything restored on load, in one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedView {
    pub filters: FilterSpec,
    /// `None` when nothing valid is stored; the caller picks its default.
    pub sort: Option<SortSpec>,
    pub expanded: BTreeMap<String, bool>,
}

/// Fail-soft view-state store over any [`Storage`] backend.
pub struct ViewState<S: Storage> {
    storage: S,
}

impl<S: Storage> ViewState<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn save_filters(&mut self, spec: &FilterSpec) {
        self.write(FILTERS_KEY, spec);
    }

    /// Stored filters, or the empty spec when absent or malformed.
    #[must_use]
    pub fn restore_filters(&self) -> FilterSpec {
        self.read::<FilterSpec>(FILTERS_KEY)
            .map(FilterSpec::normalized)
            .unwrap_or_default()
    }

    pub fn clear_filters(&mut self) {
        self.delete(FILTERS_KEY);
    }

    pub fn save_sort(&mut self, sort: &SortSpec) {
        self.write(SORT_KEY, sort);
    }

    /// Stored sort, or `None` when absent or not a known `field_order`.
    #[must_use]
    pub fn restore_sort(&self) -> Option<SortSpec> {
        self.read::<SortSpec>(SORT_KEY)
    }

    pub fn clear_sort(&mut self) {
        self.delete(SORT_KEY);
    }

    /// Records one expansion flag, keeping the others.
    pub fn set_expanded(&mut self, id: &str, open: bool) {
        let mut flags = self.expanded();
        flags.insert(id.to_string(), open);
        self.write(EXPANDED_KEY, &flags);
    }

    /// All recorded expansion flags.
    #[must_use]
    pub fn expanded(&self) -> BTreeMap<String, bool> {
        self.read(EXPANDED_KEY).unwrap_or_default()
    }

    pub fn clear_expanded(&mut self) {
        self.delete(EXPANDED_KEY);
    }

    #[must_use]
    pub fn snapshot(&self) -> PersistedView {
        PersistedView {
            filters: self.restore_filters(),
            sort: self.restore_sort(),
            expanded: self.expanded(),
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "view state read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "ignoring malformed view state");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "view state serialization failed");
                return;
            }
        };
        if let Err(e) = self.storage.set(key, &json) {
            tracing::warn!(key = %key, error = %e, "view state write failed");
        }
    }

    fn delete(&mut self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::warn!(key = %key, error = %e, "view state remove failed");
        }
    }
}
