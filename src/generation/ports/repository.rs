//! Repository port for generation job persistence and lookup.

use crate::generation::domain::{GenerationJob, JobId, JobKind, JobStatus, OwnerId, ProviderHandle};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for job repository operations.
pub type JobRepositoryResult<T> = Result<T, JobRepositoryError>;

/// Job persistence contract.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Stores a new job.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::DuplicateJob`] when the job ID already
    /// exists.
    async fn store(&self, job: &GenerationJob) -> JobRepositoryResult<()>;

    /// Persists changes to an existing job, provided its stored status still
    /// equals `expected_status`.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist
    /// or [`JobRepositoryError::StatusConflict`] when another writer moved
    /// the job since it was read.
    async fn update(
        &self,
        job: &GenerationJob,
        expected_status: JobStatus,
    ) -> JobRepositoryResult<()>;

    /// Finds a job by identifier.
    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<GenerationJob>>;

    /// Finds the job that was submitted under a provider handle.
    async fn find_by_provider_handle(
        &self,
        handle: &ProviderHandle,
    ) -> JobRepositoryResult<Option<GenerationJob>>;

    /// Returns the most recent jobs of `kind` for `owner`, newest first.
    async fn list_recent(
        &self,
        owner: OwnerId,
        kind: JobKind,
        limit: usize,
    ) -> JobRepositoryResult<Vec<GenerationJob>>;
}

/// Errors returned by job repository implementations.
#[derive(Debug, Clone, Error)]
pub enum JobRepositoryError {
    /// A job with the same identifier already exists.
    #[error("duplicate job identifier: {0}")]
    DuplicateJob(JobId),

    /// The job was not found.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The stored status differs from the one the writer read.
    #[error("job {job_id} status changed concurrently: expected {expected}, found {actual}")]
    StatusConflict {
        /// Job being written.
        job_id: JobId,
        /// Status the writer based its change on.
        expected: JobStatus,
        /// Status currently stored.
        actual: JobStatus,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted job data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl JobRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
