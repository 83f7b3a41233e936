//! In-memory session storage with write-failure injection for tests.

use crate::workspace::ports::{SessionStorage, SessionStorageError, SessionStorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory session storage.
///
/// Clones share the same entries, so a clone kept by a test observes what
/// the cache wrote.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
}

#[derive(Debug, Default)]
struct InMemoryStorageState {
    entries: HashMap<String, String>,
    write_count: usize,
    failing_writes: Option<String>,
}

impl InMemorySessionStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail with `reason`.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn fail_writes(&self, reason: impl Into<String>) -> SessionStorageResult<()> {
        self.write_state()?.failing_writes = Some(reason.into());
        Ok(())
    }

    /// Lets writes succeed again.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn restore_writes(&self) -> SessionStorageResult<()> {
        self.write_state()?.failing_writes = None;
        Ok(())
    }

    /// Returns the number of successful `set` calls.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn write_count(&self) -> SessionStorageResult<usize> {
        Ok(self.read_state()?.write_count)
    }

    fn write_state(
        &self,
    ) -> SessionStorageResult<std::sync::RwLockWriteGuard<'_, InMemoryStorageState>> {
        self.state
            .write()
            .map_err(|err| SessionStorageError::persistence(std::io::Error::other(err.to_string())))
    }

    fn read_state(
        &self,
    ) -> SessionStorageResult<std::sync::RwLockReadGuard<'_, InMemoryStorageState>> {
        self.state
            .read()
            .map_err(|err| SessionStorageError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn get(&self, key: &str) -> SessionStorageResult<Option<String>> {
        Ok(self.read_state()?.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SessionStorageResult<()> {
        let mut state = self.write_state()?;
        if let Some(reason) = &state.failing_writes {
            return Err(SessionStorageError::persistence(std::io::Error::other(
                reason.clone(),
            )));
        }
        state.entries.insert(key.to_owned(), value.to_owned());
        state.write_count = state.write_count.saturating_add(1);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionStorageResult<()> {
        self.write_state()?.entries.remove(key);
        Ok(())
    }
}
