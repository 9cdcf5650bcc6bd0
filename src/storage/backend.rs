//! Storage backend abstraction.
//!
//! This module defines the [`Storage`] trait: a string-keyed, string-valued
//! store with get/set/remove. The view-state layer stores its JSON-encoded
//! records through it and never depends on a concrete backend.

use crate::domain::error::Result;

/// Abstraction over key/value storage backends.
///
/// # Implementations
///
/// - [`JsonStorage`](crate::storage::JsonStorage): JSON file with atomic writes, survives restarts
/// - [`MemoryStorage`](crate::storage::MemoryStorage): in-process map, lives as long as the session
///
/// # Examples
///
/// ```
/// use reportlens::storage::{MemoryStorage, Storage};
///
/// let mut storage = MemoryStorage::default();
/// storage.set("sort", "name_asc")?;
/// assert_eq!(storage.get("sort")?.as_deref(), Some("name_asc"));
/// storage.remove("sort")?;
/// assert_eq!(storage.get("sort")?, None);
/// # Ok::<(), reportlens::ReportLensError>(())
/// ```
pub trait Storage: Send {
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the read operation fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write operation fails.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the write operation fails.
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
