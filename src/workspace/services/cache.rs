//! Session-scoped workspace cache with debounced, best-effort persistence.

use crate::generation::domain::{AssetUrl, GenerationJob, JobStatus, OwnerId};
use crate::workspace::{
    domain::{WorkspaceDomainError, WorkspaceItem, WorkspaceItemId, WorkspaceSession},
    ports::{SessionStorage, SessionStorageError},
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Storage key of the session marker.
pub const SESSION_KEY: &str = "workspace.session";
/// Storage key of the serialized items.
pub const ITEMS_KEY: &str = "workspace.items";

/// Workspace persistence settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Window in which mutations are batched into one write, in milliseconds.
    pub debounce_ms: u64,
}

impl WorkspaceConfig {
    /// Returns the debounce window.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

/// Result of adding an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The item was inserted.
    Added(WorkspaceItem),
    /// An item with the same output URL already exists.
    Duplicate(WorkspaceItemId),
}

/// State of the durable copy relative to memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// Nothing has changed since the cache was opened.
    Clean,
    /// Changes are waiting for the debounce window to close.
    Pending,
    /// The latest snapshot was written.
    Saved {
        /// When the write completed.
        at: DateTime<Utc>,
    },
    /// The latest write failed; memory remains authoritative.
    Failed {
        /// Storage error description.
        message: String,
    },
}

/// Service-level errors for workspace operations.
#[derive(Debug, Clone, Error)]
pub enum WorkspaceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WorkspaceDomainError),
    /// Session storage failed.
    #[error(transparent)]
    Storage(#[from] SessionStorageError),
}

/// Result type for workspace operations.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(Debug)]
struct WorkspaceState {
    session: WorkspaceSession,
    items: IndexMap<WorkspaceItemId, WorkspaceItem>,
    urls: HashMap<AssetUrl, WorkspaceItemId>,
    revision: u64,
    persisted_revision: u64,
}

impl WorkspaceState {
    fn new(session: WorkspaceSession) -> Self {
        Self {
            session,
            items: IndexMap::new(),
            urls: HashMap::new(),
            revision: 0,
            persisted_revision: 0,
        }
    }

    fn insert(&mut self, item: WorkspaceItem) -> AddOutcome {
        if let Some(existing) = self.urls.get(item.url()) {
            return AddOutcome::Duplicate(*existing);
        }
        self.urls.insert(item.url().clone(), item.id());
        self.items.insert(item.id(), item.clone());
        AddOutcome::Added(item)
    }

    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }
}

struct CacheInner<S, C> {
    state: RwLock<WorkspaceState>,
    storage: Arc<S>,
    clock: Arc<C>,
    dirty: Notify,
    shutdown: CancellationToken,
    status: watch::Sender<PersistenceStatus>,
    write_lock: tokio::sync::Mutex<()>,
}

/// In-memory workspace for one owner's session.
///
/// Memory is authoritative. Every mutation schedules a snapshot write of
/// the full item set; writes inside one debounce window collapse into one.
pub struct WorkspaceCache<S, C>
where
    S: SessionStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    inner: Arc<CacheInner<S, C>>,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

impl<S, C> WorkspaceCache<S, C>
where
    S: SessionStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Opens the workspace for `owner_id`.
    ///
    /// Stored items are restored only when the stored session marker belongs
    /// to the same owner. A missing marker or a marker for another owner
    /// discards stored items and starts a fresh session. Storage failures are
    /// logged and reported through [`WorkspaceCache::persistence_status`].
    pub async fn open(
        owner_id: OwnerId,
        storage: Arc<S>,
        clock: Arc<C>,
        config: WorkspaceConfig,
    ) -> Self {
        let (status, _) = watch::channel(PersistenceStatus::Clean);
        let restored = restore_session(owner_id, storage.as_ref()).await;
        let state = match restored {
            Some((session, items)) => {
                let mut state = WorkspaceState::new(session);
                for item in items {
                    state.insert(item);
                }
                state
            }
            None => {
                let session = WorkspaceSession::start(owner_id, &*clock);
                if let Err(err) = start_session(storage.as_ref(), &session).await {
                    tracing::warn!(owner_id = %owner_id, error = %err, "failed to reset workspace storage");
                    status.send_replace(PersistenceStatus::Failed {
                        message: err.to_string(),
                    });
                }
                WorkspaceState::new(session)
            }
        };

        let inner = Arc::new(CacheInner {
            state: RwLock::new(state),
            storage,
            clock,
            dirty: Notify::new(),
            shutdown: CancellationToken::new(),
            status,
            write_lock: tokio::sync::Mutex::new(()),
        });
        let flusher = tokio::spawn(run_flusher(Arc::clone(&inner), config.debounce()));
        Self {
            inner,
            flusher: Mutex::new(Some(flusher)),
        }
    }

    /// Returns the current session marker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn session(&self) -> WorkspaceResult<WorkspaceSession> {
        Ok(self.inner.read_state()?.session.clone())
    }

    /// Adds an item unless one with the same output URL is present.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn add(&self, item: WorkspaceItem) -> WorkspaceResult<AddOutcome> {
        let outcome = {
            let mut state = self.inner.write_state()?;
            let outcome = state.insert(item);
            if matches!(outcome, AddOutcome::Added(_)) {
                state.bump();
            }
            outcome
        };
        match &outcome {
            AddOutcome::Added(item) => {
                tracing::debug!(item_id = %item.id(), url = %item.url(), "workspace item added");
                self.inner.schedule();
            }
            AddOutcome::Duplicate(existing) => {
                tracing::debug!(item_id = %existing, "workspace already holds this output");
            }
        }
        Ok(outcome)
    }

    /// Adds every output of a completed job.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::JobNotCompleted`] for jobs that have
    /// not completed and [`WorkspaceError::Storage`] when the state lock is
    /// poisoned.
    pub fn import_job(&self, job: &GenerationJob) -> WorkspaceResult<Vec<AddOutcome>> {
        if job.status() != JobStatus::Completed {
            return Err(WorkspaceDomainError::JobNotCompleted {
                job_id: job.id(),
                status: job.status(),
            }
            .into());
        }
        job.outputs()
            .iter()
            .map(|output| self.add(WorkspaceItem::from_job_output(job, output, &*self.inner.clock)))
            .collect()
    }

    /// Removes an item, returning it when present.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn remove(&self, item_id: WorkspaceItemId) -> WorkspaceResult<Option<WorkspaceItem>> {
        let removed = {
            let mut state = self.inner.write_state()?;
            let removed = state.items.shift_remove(&item_id);
            if let Some(item) = &removed {
                state.urls.remove(item.url());
                state.bump();
            }
            removed
        };
        if removed.is_some() {
            self.inner.schedule();
        }
        Ok(removed)
    }

    /// Removes every item, returning how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn clear(&self) -> WorkspaceResult<usize> {
        let cleared = {
            let mut state = self.inner.write_state()?;
            let cleared = state.items.len();
            state.items.clear();
            state.urls.clear();
            state.bump();
            cleared
        };
        self.inner.schedule();
        Ok(cleared)
    }

    /// Returns the items, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn list(&self) -> WorkspaceResult<Vec<WorkspaceItem>> {
        Ok(self.inner.read_state()?.items.values().rev().cloned().collect())
    }

    /// Returns one item by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn get(&self, item_id: WorkspaceItemId) -> WorkspaceResult<Option<WorkspaceItem>> {
        Ok(self.inner.read_state()?.items.get(&item_id).cloned())
    }

    /// Returns whether an item already references `url`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn contains_url(&self, url: &AssetUrl) -> WorkspaceResult<bool> {
        Ok(self.inner.read_state()?.urls.contains_key(url))
    }

    /// Returns the number of items.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn len(&self) -> WorkspaceResult<usize> {
        Ok(self.inner.read_state()?.items.len())
    }

    /// Returns whether the workspace holds no items.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the state lock is poisoned.
    pub fn is_empty(&self) -> WorkspaceResult<bool> {
        Ok(self.inner.read_state()?.items.is_empty())
    }

    /// Subscribes to persistence status changes.
    #[must_use]
    pub fn persistence_status(&self) -> watch::Receiver<PersistenceStatus> {
        self.inner.status.subscribe()
    }

    /// Writes the current snapshot immediately if it has unsaved changes.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the write fails. The failure
    /// is also published as [`PersistenceStatus::Failed`].
    pub async fn flush(&self) -> WorkspaceResult<()> {
        Ok(self.inner.persist().await?)
    }

    /// Flushes pending changes and stops background persistence.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when the final write fails.
    pub async fn close(&self) -> WorkspaceResult<()> {
        let flushed = self.inner.persist().await;
        self.stop_flusher().await;
        Ok(flushed?)
    }

    /// Ends the session on sign-out.
    ///
    /// Background persistence stops, memory is cleared and the stored items
    /// and session marker are removed. The cache remains usable in memory
    /// only.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Storage`] when stored keys cannot be removed
    /// or the state lock is poisoned.
    pub async fn end_session(&self) -> WorkspaceResult<()> {
        self.stop_flusher().await;
        {
            let mut state = self.inner.write_state()?;
            state.items.clear();
            state.urls.clear();
            state.bump();
            state.persisted_revision = state.revision;
        }
        let _guard = self.inner.write_lock.lock().await;
        self.inner.storage.remove(ITEMS_KEY).await?;
        self.inner.storage.remove(SESSION_KEY).await?;
        self.inner.status.send_replace(PersistenceStatus::Clean);
        Ok(())
    }

    async fn stop_flusher(&self) {
        self.inner.shutdown.cancel();
        let handle = self
            .flusher
            .lock()
            .ok()
            .and_then(|mut flusher| flusher.take());
        if let Some(task) = handle {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "workspace flusher ended abnormally");
            }
        }
    }
}

impl<S, C> Drop for WorkspaceCache<S, C>
where
    S: SessionStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl<S, C> CacheInner<S, C>
where
    S: SessionStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, WorkspaceState>, SessionStorageError> {
        self.state.read().map_err(|err| {
            SessionStorageError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, WorkspaceState>, SessionStorageError> {
        self.state.write().map_err(|err| {
            SessionStorageError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn schedule(&self) {
        self.status.send_replace(PersistenceStatus::Pending);
        self.dirty.notify_one();
    }

    async fn persist(&self) -> Result<(), SessionStorageError> {
        let _guard = self.write_lock.lock().await;
        let (revision, snapshot) = {
            let state = self.read_state()?;
            if state.revision == state.persisted_revision {
                return Ok(());
            }
            let items: Vec<&WorkspaceItem> = state.items.values().collect();
            let encoded = serde_json::to_string(&items)
                .map_err(|err| SessionStorageError::invalid_data(ITEMS_KEY, err))?;
            (state.revision, encoded)
        };

        match self.storage.set(ITEMS_KEY, &snapshot).await {
            Ok(()) => {
                let mut state = self.write_state()?;
                state.persisted_revision = state.persisted_revision.max(revision);
                let settled = state.persisted_revision == state.revision;
                drop(state);
                if settled {
                    self.status.send_replace(PersistenceStatus::Saved {
                        at: self.clock.utc(),
                    });
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist workspace snapshot");
                self.status.send_replace(PersistenceStatus::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }
}

async fn run_flusher<S, C>(inner: Arc<CacheInner<S, C>>, debounce: Duration)
where
    S: SessionStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            () = inner.shutdown.cancelled() => return,
            () = inner.dirty.notified() => {}
        }
        tokio::select! {
            () = inner.shutdown.cancelled() => return,
            () = tokio::time::sleep(debounce) => {}
        }
        if let Err(err) = inner.persist().await {
            tracing::debug!(error = %err, "debounced workspace write failed");
        }
    }
}

async fn restore_session<S>(
    owner_id: OwnerId,
    storage: &S,
) -> Option<(WorkspaceSession, Vec<WorkspaceItem>)>
where
    S: SessionStorage + ?Sized,
{
    let session = match read_json::<WorkspaceSession, S>(storage, SESSION_KEY).await {
        Ok(Some(session)) if session.belongs_to(owner_id) => session,
        Ok(Some(_)) => {
            tracing::info!(owner_id = %owner_id, "stored workspace belongs to another owner, discarding");
            return None;
        }
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable workspace session marker, starting fresh");
            return None;
        }
    };
    match read_json::<Vec<WorkspaceItem>, S>(storage, ITEMS_KEY).await {
        Ok(items) => Some((session, items.unwrap_or_default())),
        Err(err) => {
            tracing::warn!(error = %err, "unreadable workspace items, starting empty");
            Some((session, Vec::new()))
        }
    }
}

async fn start_session<S>(storage: &S, session: &WorkspaceSession) -> Result<(), SessionStorageError>
where
    S: SessionStorage + ?Sized,
{
    storage.remove(ITEMS_KEY).await?;
    let marker = serde_json::to_string(session)
        .map_err(|err| SessionStorageError::invalid_data(SESSION_KEY, err))?;
    storage.set(SESSION_KEY, &marker).await
}

async fn read_json<T, S>(storage: &S, key: &str) -> Result<Option<T>, SessionStorageError>
where
    T: for<'de> Deserialize<'de>,
    S: SessionStorage + ?Sized,
{
    let Some(raw) = storage.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| SessionStorageError::invalid_data(key, err))
}
