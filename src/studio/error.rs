//! Errors surfaced by studio operations.

use crate::continuity::services::TrackerError;
use crate::gateway::services::GatewayError;
use crate::generation::domain::{GenerationDomainError, JobId};
use crate::generation::services::JobLifecycleError;
use crate::workspace::services::WorkspaceError;
use thiserror::Error;

/// Errors returned by [`super::Studio`] operations.
#[derive(Debug, Clone, Error)]
pub enum StudioError {
    /// The request was rejected before a job was created.
    #[error(transparent)]
    Validation(#[from] GenerationDomainError),
    /// Creating or reading a job failed.
    #[error(transparent)]
    Lifecycle(#[from] JobLifecycleError),
    /// The job could not be submitted to the provider.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// A workspace operation failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    /// A continuity operation failed.
    #[error(transparent)]
    Continuity(#[from] TrackerError),
    /// The job does not exist.
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    /// Internal bookkeeping was poisoned by a panicking task.
    #[error("studio watch registry is poisoned")]
    RegistryPoisoned,
}

/// Result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;
