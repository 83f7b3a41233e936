//! Service layer for job creation, status transitions and lookup.

use crate::generation::{
    domain::{
        CanonicalParams, GenerationDomainError, GenerationJob, JobId, JobKind, JobMetadata,
        JobTransition, OwnerId, ProviderHandle,
    },
    ports::{JobRepository, JobRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Number of times a transition is re-applied after a concurrent write.
const MAX_CONFLICT_RETRIES: usize = 3;

/// Service-level errors for job lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum JobLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] GenerationDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] JobRepositoryError),
    /// The job does not exist.
    #[error("job not found: {0}")]
    NotFound(JobId),
}

/// Result type for job lifecycle service operations.
pub type JobLifecycleResult<T> = Result<T, JobLifecycleError>;

/// Job lifecycle orchestration service.
pub struct JobLifecycleService<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for JobLifecycleService<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> JobLifecycleService<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new job lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Returns the injected clock.
    #[must_use]
    pub const fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Returns the backing repository.
    #[must_use]
    pub const fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Creates and stores a pending job.
    ///
    /// # Errors
    ///
    /// Returns [`JobLifecycleError::Repository`] when the store rejects the
    /// write. Nothing is retried.
    pub async fn create_job(
        &self,
        owner_id: OwnerId,
        params: CanonicalParams,
    ) -> JobLifecycleResult<GenerationJob> {
        let job = GenerationJob::new(owner_id, params, &*self.clock);
        self.repository.store(&job).await?;
        tracing::info!(
            job_id = %job.id(),
            owner_id = %owner_id,
            kind = %job.kind(),
            model_id = %job.model_id(),
            "created generation job"
        );
        Ok(job)
    }

    /// Applies a status transition to a stored job.
    ///
    /// When another writer moves the job between read and write, the job is
    /// reloaded and the transition re-applied against the fresh state, so a
    /// concurrent advance surfaces as
    /// [`GenerationDomainError::InvalidStateTransition`] instead of being
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`JobLifecycleError::NotFound`] for unknown jobs,
    /// [`JobLifecycleError::Domain`] when the transition is not permitted and
    /// [`JobLifecycleError::Repository`] for persistence failures.
    pub async fn update_status(
        &self,
        job_id: JobId,
        transition: JobTransition,
    ) -> JobLifecycleResult<GenerationJob> {
        let mut conflicts = 0;
        loop {
            let mut job = self.load(job_id).await?;
            let previous = job.status();
            job.apply(transition.clone(), &*self.clock)?;

            match self.repository.update(&job, previous).await {
                Ok(()) => {
                    tracing::info!(
                        job_id = %job_id,
                        from = %previous,
                        to = %job.status(),
                        "job status changed"
                    );
                    return Ok(job);
                }
                Err(JobRepositoryError::StatusConflict { actual, .. })
                    if conflicts < MAX_CONFLICT_RETRIES =>
                {
                    conflicts += 1;
                    tracing::warn!(
                        job_id = %job_id,
                        expected = %previous,
                        actual = %actual,
                        attempt = conflicts,
                        "job changed concurrently, re-applying transition"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Replaces a job's metadata bag without changing its status.
    ///
    /// # Errors
    ///
    /// Returns [`JobLifecycleError::NotFound`] for unknown jobs and
    /// [`JobLifecycleError::Repository`] for persistence failures.
    pub async fn update_metadata(
        &self,
        job_id: JobId,
        metadata: JobMetadata,
    ) -> JobLifecycleResult<GenerationJob> {
        let mut job = self.load(job_id).await?;
        let status = job.status();
        job.set_metadata(metadata, &*self.clock);
        self.repository.update(&job, status).await?;
        Ok(job)
    }

    /// Retrieves a job by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JobLifecycleError::Repository`] when lookup fails.
    pub async fn get_job(&self, job_id: JobId) -> JobLifecycleResult<Option<GenerationJob>> {
        Ok(self.repository.find_by_id(job_id).await?)
    }

    /// Retrieves the job submitted under a provider handle.
    ///
    /// # Errors
    ///
    /// Returns [`JobLifecycleError::Repository`] when lookup fails.
    pub async fn find_by_provider_handle(
        &self,
        handle: &ProviderHandle,
    ) -> JobLifecycleResult<Option<GenerationJob>> {
        Ok(self.repository.find_by_provider_handle(handle).await?)
    }

    /// Lists an owner's most recent jobs of one kind, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`JobLifecycleError::Repository`] when lookup fails.
    pub async fn list_recent(
        &self,
        owner_id: OwnerId,
        kind: JobKind,
        limit: usize,
    ) -> JobLifecycleResult<Vec<GenerationJob>> {
        Ok(self.repository.list_recent(owner_id, kind, limit).await?)
    }

    async fn load(&self, job_id: JobId) -> JobLifecycleResult<GenerationJob> {
        self.repository
            .find_by_id(job_id)
            .await?
            .ok_or(JobLifecycleError::NotFound(job_id))
    }
}
