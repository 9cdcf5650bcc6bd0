//! In-memory storage backend for session-scoped view state.

use crate::domain::error::Result;
use crate::storage::backend::Storage;
use std::collections::HashMap;

/// Key/value map that lives as long as the worker thread.
///
/// Used when the plugin is configured with `state_scope "session"`: state
/// survives reloads of the report within one Zellij session but is never
/// written to disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        tracing::trace!(key = %key, "memory set");
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        tracing::trace!(key = %key, "memory remove");
        self.entries.remove(key);
        Ok(())
    }
}
