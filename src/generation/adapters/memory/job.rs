//! In-memory repository for generation jobs.

use crate::generation::{
    domain::{GenerationJob, JobId, JobKind, JobStatus, OwnerId, ProviderHandle},
    ports::{JobChangeFeed, JobRepository, JobRepositoryError, JobRepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const CHANGE_FEED_CAPACITY: usize = 256;

/// Thread-safe in-memory job repository.
///
/// Every successful write is published on the repository's change feed.
#[derive(Debug, Clone)]
pub struct InMemoryJobRepository {
    state: Arc<RwLock<InMemoryJobState>>,
    changes: broadcast::Sender<GenerationJob>,
}

#[derive(Debug, Default)]
struct InMemoryJobState {
    jobs: HashMap<JobId, GenerationJob>,
    handle_index: HashMap<ProviderHandle, JobId>,
    reject_writes: Option<String>,
}

impl InMemoryJobRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(InMemoryJobState::default())),
            changes,
        }
    }

    /// Makes subsequent writes fail with a persistence error until
    /// [`InMemoryJobRepository::accept_writes`] is called.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn reject_writes(&self, reason: impl Into<String>) -> JobRepositoryResult<()> {
        let mut state = self.write_state()?;
        state.reject_writes = Some(reason.into());
        Ok(())
    }

    /// Re-enables writes after [`InMemoryJobRepository::reject_writes`].
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn accept_writes(&self) -> JobRepositoryResult<()> {
        let mut state = self.write_state()?;
        state.reject_writes = None;
        Ok(())
    }

    fn write_state(&self) -> JobRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryJobState>> {
        self.state.write().map_err(|err| {
            JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn read_state(&self) -> JobRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryJobState>> {
        self.state.read().map_err(|err| {
            JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn publish(&self, job: &GenerationJob) {
        if self.changes.send(job.clone()).is_err() {
            tracing::trace!(job_id = %job.id(), "no job change subscribers");
        }
    }
}

impl Default for InMemoryJobRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_writable(state: &InMemoryJobState) -> JobRepositoryResult<()> {
    state.reject_writes.as_ref().map_or(Ok(()), |reason| {
        Err(JobRepositoryError::persistence(std::io::Error::other(
            reason.clone(),
        )))
    })
}

fn index_handle(state: &mut InMemoryJobState, job: &GenerationJob) {
    if let Some(handle) = job.provider_handle() {
        state.handle_index.insert(handle.clone(), job.id());
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn store(&self, job: &GenerationJob) -> JobRepositoryResult<()> {
        {
            let mut state = self.write_state()?;
            ensure_writable(&state)?;
            if state.jobs.contains_key(&job.id()) {
                return Err(JobRepositoryError::DuplicateJob(job.id()));
            }
            index_handle(&mut state, job);
            state.jobs.insert(job.id(), job.clone());
        }
        self.publish(job);
        Ok(())
    }

    async fn update(
        &self,
        job: &GenerationJob,
        expected_status: JobStatus,
    ) -> JobRepositoryResult<()> {
        {
            let mut state = self.write_state()?;
            ensure_writable(&state)?;
            let stored_status = state
                .jobs
                .get(&job.id())
                .ok_or(JobRepositoryError::NotFound(job.id()))?
                .status();
            if stored_status != expected_status {
                return Err(JobRepositoryError::StatusConflict {
                    job_id: job.id(),
                    expected: expected_status,
                    actual: stored_status,
                });
            }
            index_handle(&mut state, job);
            state.jobs.insert(job.id(), job.clone());
        }
        self.publish(job);
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<GenerationJob>> {
        let state = self.read_state()?;
        Ok(state.jobs.get(&id).cloned())
    }

    async fn find_by_provider_handle(
        &self,
        handle: &ProviderHandle,
    ) -> JobRepositoryResult<Option<GenerationJob>> {
        let state = self.read_state()?;
        Ok(state
            .handle_index
            .get(handle)
            .and_then(|id| state.jobs.get(id))
            .cloned())
    }

    async fn list_recent(
        &self,
        owner: OwnerId,
        kind: JobKind,
        limit: usize,
    ) -> JobRepositoryResult<Vec<GenerationJob>> {
        let state = self.read_state()?;
        let mut jobs: Vec<GenerationJob> = state
            .jobs
            .values()
            .filter(|job| job.owner_id() == owner && job.kind() == kind)
            .cloned()
            .collect();
        jobs.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        jobs.truncate(limit);
        Ok(jobs)
    }
}

impl JobChangeFeed for InMemoryJobRepository {
    fn subscribe(&self) -> broadcast::Receiver<GenerationJob> {
        self.changes.subscribe()
    }
}
