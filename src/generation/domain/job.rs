//! Generation job aggregate root and lifecycle transitions.

use super::{
    AssetUrl, CanonicalParams, GenerationDomainError, JobId, JobKind, JobMetadata, JobStatus,
    ModelId, OwnerId, Prompt, ProviderHandle, QualityTier, ReferenceImage, Seed,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One generated asset produced by a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutput {
    url: AssetUrl,
    duration_seconds: Option<u32>,
}

impl JobOutput {
    /// Creates an output reference.
    #[must_use]
    pub const fn new(url: AssetUrl) -> Self {
        Self {
            url,
            duration_seconds: None,
        }
    }

    /// Sets the clip duration for video outputs.
    #[must_use]
    pub const fn with_duration_seconds(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Returns the output URL.
    #[must_use]
    pub const fn url(&self) -> &AssetUrl {
        &self.url
    }

    /// Returns the clip duration, if any.
    #[must_use]
    pub const fn duration_seconds(&self) -> Option<u32> {
        self.duration_seconds
    }
}

/// Structured failure payload recorded on failed jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredFailure")]
pub struct JobFailure {
    status_code: Option<u16>,
    raw_message: String,
    user_message: String,
}

/// Unchecked shape of a serialized [`JobFailure`].
#[derive(Deserialize)]
struct StoredFailure {
    status_code: Option<u16>,
    raw_message: String,
    user_message: String,
}

impl TryFrom<StoredFailure> for JobFailure {
    type Error = GenerationDomainError;

    fn try_from(value: StoredFailure) -> Result<Self, Self::Error> {
        Self::new(value.status_code, value.raw_message, value.user_message)
    }
}

impl JobFailure {
    /// Creates a failure payload.
    ///
    /// `user_message` is what end users see; `raw_message` keeps the
    /// provider or internal detail for logs.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::EmptyFailureMessage`] when the user
    /// message is empty after trimming.
    pub fn new(
        status_code: Option<u16>,
        raw_message: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Result<Self, GenerationDomainError> {
        let user = user_message.into().trim().to_owned();
        if user.is_empty() {
            return Err(GenerationDomainError::EmptyFailureMessage);
        }
        Ok(Self {
            status_code,
            raw_message: raw_message.into(),
            user_message: user,
        })
    }

    /// Creates a failure whose raw and user messages are the same text.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::EmptyFailureMessage`] when the message
    /// is empty after trimming.
    pub fn from_message(message: impl Into<String>) -> Result<Self, GenerationDomainError> {
        let text = message.into();
        Self::new(None, text.clone(), text)
    }

    /// Returns the provider status code, if one was reported.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns the raw provider or internal message.
    #[must_use]
    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }

    /// Returns the human-readable message for end users.
    #[must_use]
    pub fn user_message(&self) -> &str {
        &self.user_message
    }
}

/// A requested status change together with the data it attaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTransition {
    /// The provider accepted the job.
    Processing {
        /// Provider handle for later status checks and callbacks.
        provider_handle: Option<ProviderHandle>,
    },
    /// The provider finished the job.
    Completed {
        /// Generated outputs; must not be empty.
        outputs: Vec<JobOutput>,
    },
    /// The job failed.
    Failed {
        /// Failure detail.
        failure: JobFailure,
    },
}

impl JobTransition {
    /// Returns the status this transition moves the job into.
    #[must_use]
    pub const fn target(&self) -> JobStatus {
        match self {
            Self::Processing { .. } => JobStatus::Processing,
            Self::Completed { .. } => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Generation job aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    id: JobId,
    owner_id: OwnerId,
    params: CanonicalParams,
    status: JobStatus,
    provider_handle: Option<ProviderHandle>,
    outputs: Vec<JobOutput>,
    failure: Option<JobFailure>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted job.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedJobData {
    /// Persisted job identifier.
    pub id: JobId,
    /// Persisted owner.
    pub owner_id: OwnerId,
    /// Persisted canonical parameters.
    pub params: CanonicalParams,
    /// Persisted status.
    pub status: JobStatus,
    /// Persisted provider handle.
    pub provider_handle: Option<ProviderHandle>,
    /// Persisted outputs.
    pub outputs: Vec<JobOutput>,
    /// Persisted failure payload.
    pub failure: Option<JobFailure>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted processing start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl GenerationJob {
    /// Creates a pending job from canonical parameters.
    #[must_use]
    pub fn new(owner_id: OwnerId, params: CanonicalParams, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: JobId::new(),
            owner_id,
            params,
            status: JobStatus::Pending,
            provider_handle: None,
            outputs: Vec::new(),
            failure: None,
            created_at: timestamp,
            started_at: None,
            completed_at: None,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            params: data.params,
            status: data.status,
            provider_handle: data.provider_handle,
            outputs: data.outputs,
            failure: data.failure,
            created_at: data.created_at,
            started_at: data.started_at,
            completed_at: data.completed_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Returns the canonical parameters the job was created with.
    #[must_use]
    pub const fn params(&self) -> &CanonicalParams {
        &self.params
    }

    /// Returns the job modality.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.params.kind
    }

    /// Returns the prompt.
    #[must_use]
    pub const fn prompt(&self) -> &Prompt {
        &self.params.prompt
    }

    /// Returns the chosen model.
    #[must_use]
    pub const fn model_id(&self) -> &ModelId {
        &self.params.model_id
    }

    /// Returns the requested quality tier.
    #[must_use]
    pub const fn quality(&self) -> QualityTier {
        self.params.quality
    }

    /// Returns the reference image, if any.
    #[must_use]
    pub const fn reference(&self) -> Option<&ReferenceImage> {
        self.params.reference.as_ref()
    }

    /// Returns the seed, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<Seed> {
        self.params.seed
    }

    /// Returns the metadata bag.
    #[must_use]
    pub const fn metadata(&self) -> &JobMetadata {
        &self.params.metadata
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the provider handle, if the job was accepted.
    #[must_use]
    pub const fn provider_handle(&self) -> Option<&ProviderHandle> {
        self.provider_handle.as_ref()
    }

    /// Returns the generated outputs.
    #[must_use]
    pub fn outputs(&self) -> &[JobOutput] {
        &self.outputs
    }

    /// Returns the failure payload for failed jobs.
    #[must_use]
    pub const fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the job entered `processing`.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the job reached a terminal status.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the metadata bag without changing status.
    pub fn set_metadata(&mut self, metadata: JobMetadata, clock: &impl Clock) {
        self.params.metadata = metadata;
        self.touch(clock);
    }

    /// Checks whether the job may move to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::InvalidStateTransition`] when the
    /// job is terminal or `target` does not rank after the current status.
    pub const fn check_transition(&self, target: JobStatus) -> Result<(), GenerationDomainError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(GenerationDomainError::InvalidStateTransition {
                job_id: self.id,
                from: self.status,
                to: target,
            })
        }
    }

    /// Applies a status transition.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::InvalidStateTransition`] when the
    /// target status is not reachable, or
    /// [`GenerationDomainError::CompletedWithoutOutput`] when completing
    /// without outputs. The job is left unchanged on error.
    pub fn apply(
        &mut self,
        transition: JobTransition,
        clock: &impl Clock,
    ) -> Result<(), GenerationDomainError> {
        let target = transition.target();
        self.check_transition(target)?;

        let timestamp = clock.utc();
        match transition {
            JobTransition::Processing { provider_handle } => {
                if provider_handle.is_some() {
                    self.provider_handle = provider_handle;
                }
                self.started_at = Some(timestamp);
            }
            JobTransition::Completed { outputs } => {
                if outputs.is_empty() {
                    return Err(GenerationDomainError::CompletedWithoutOutput(self.id));
                }
                self.outputs = outputs;
                self.completed_at = Some(timestamp);
            }
            JobTransition::Failed { failure } => {
                self.failure = Some(failure);
                self.completed_at = Some(timestamp);
            }
        }
        self.status = target;
        self.updated_at = timestamp;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
