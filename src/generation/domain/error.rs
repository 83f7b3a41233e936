//! Error types for generation domain validation and parsing.

use super::{JobId, JobStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating generation domain values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationDomainError {
    /// The prompt is empty after trimming.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// The image-to-image strength lies outside `0.0..=1.0`.
    #[error("strength {0} is outside the range 0.0..=1.0")]
    StrengthOutOfRange(f64),

    /// The model identifier is empty after trimming.
    #[error("model identifier must not be empty")]
    EmptyModelId,

    /// The provider handle is empty after trimming.
    #[error("provider handle must not be empty")]
    EmptyProviderHandle,

    /// An output or reference URL is empty after trimming.
    #[error("URL must not be empty")]
    EmptyUrl,

    /// Explicit dimensions must be positive.
    #[error("{field} must be a positive number of pixels")]
    InvalidDimension {
        /// Name of the offending dimension.
        field: &'static str,
    },

    /// A failure record needs a user-facing message.
    #[error("failed jobs require a non-empty error message")]
    EmptyFailureMessage,

    /// A job cannot complete without at least one output.
    #[error("job {0} cannot complete without outputs")]
    CompletedWithoutOutput(JobId),

    /// The requested status is not reachable from the current status.
    #[error("invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Job whose transition was rejected.
        job_id: JobId,
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },
}

/// Error returned while parsing job statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(pub String);

/// Error returned while parsing job kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job kind: {0}")]
pub struct ParseJobKindError(pub String);

/// Error returned while parsing quality tiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown quality tier: {0}")]
pub struct ParseQualityTierError(pub String);

/// Error returned while parsing content modes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown content mode: {0}")]
pub struct ParseContentModeError(pub String);
