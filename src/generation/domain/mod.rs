//! Domain model for generation jobs.
//!
//! The generation domain models canonical request parameters, the job
//! aggregate with its monotonic status machine, and the output and failure
//! payloads attached on completion. Infrastructure concerns stay outside
//! this boundary.

mod error;
mod ids;
mod job;
mod kind;
mod params;
mod request;
mod status;

pub use error::{
    GenerationDomainError, ParseContentModeError, ParseJobKindError, ParseJobStatusError,
    ParseQualityTierError,
};
pub use ids::{JobId, ModelId, OwnerId, ProviderHandle};
pub use job::{GenerationJob, JobFailure, JobOutput, JobTransition, PersistedJobData};
pub use kind::{ContentMode, JobKind, QualityTier};
pub use params::{
    ASPECT_RATIO_FIELD, AssetUrl, CanonicalParams, HEIGHT_FIELD, JobMetadata,
    NEGATIVE_PROMPT_FIELD, PROMPT_FIELD, Prompt, ReferenceImage, SEED_FIELD, Seed, Strength,
    WIDTH_FIELD,
};
pub use request::{DefaultModels, GenerationRequest};
pub use status::JobStatus;
