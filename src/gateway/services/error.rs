//! Errors raised by gateway services.

use crate::gateway::domain::MappingError;
use crate::gateway::ports::ProviderError;
use crate::generation::domain::{GenerationDomainError, JobId, JobStatus, ProviderHandle};
use crate::generation::services::JobLifecycleError;
use thiserror::Error;

/// Service-level errors for submission and callback handling.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Configuration lookup or parameter validation failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// Reading or updating the job failed.
    #[error(transparent)]
    Lifecycle(#[from] JobLifecycleError),
    /// A failure payload could not be built.
    #[error(transparent)]
    Domain(#[from] GenerationDomainError),
    /// A provider status check failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The job does not exist.
    #[error("job not found: {0}")]
    NotFound(JobId),
    /// Only pending jobs are submitted.
    #[error("job {job_id} is {status}, only pending jobs can be submitted")]
    NotPending {
        /// Offending job.
        job_id: JobId,
        /// Its current status.
        status: JobStatus,
    },
    /// No job was submitted under the handle.
    #[error("no job for provider handle {0}")]
    UnknownHandle(ProviderHandle),
    /// The job was never accepted by a provider.
    #[error("job {0} has no provider handle")]
    MissingProviderHandle(JobId),
}

impl GatewayError {
    /// Returns whether the error is a rejected transition caused by a
    /// concurrent writer settling the job first.
    #[must_use]
    pub const fn is_lost_race(&self) -> bool {
        matches!(
            self,
            Self::Lifecycle(JobLifecycleError::Domain(
                GenerationDomainError::InvalidStateTransition { .. }
            ))
        )
    }
}

/// Result type for gateway service operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
