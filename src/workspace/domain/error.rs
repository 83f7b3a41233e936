//! Error types for workspace domain operations.

use crate::generation::domain::{JobId, JobStatus};
use thiserror::Error;

/// Errors returned while deriving workspace items.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceDomainError {
    /// Only completed jobs have outputs to import.
    #[error("job {job_id} is {status}; only completed jobs can be imported")]
    JobNotCompleted {
        /// Offending job.
        job_id: JobId,
        /// Its current status.
        status: JobStatus,
    },
}
