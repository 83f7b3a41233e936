//! Workspace items derived from completed job outputs.

use crate::generation::domain::{
    AssetUrl, GenerationJob, JobId, JobKind, JobOutput, QualityTier, Seed,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a workspace item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceItemId(Uuid);

impl WorkspaceItemId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for WorkspaceItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkspaceItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One generated asset held in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceItem {
    id: WorkspaceItemId,
    url: AssetUrl,
    job_id: JobId,
    prompt: String,
    kind: JobKind,
    quality: QualityTier,
    model_label: String,
    duration_seconds: Option<u32>,
    seed: Option<Seed>,
    added_at: DateTime<Utc>,
}

impl WorkspaceItem {
    /// Builds an item for one output of `job`, copying the job's prompt and
    /// generation settings.
    #[must_use]
    pub fn from_job_output(job: &GenerationJob, output: &JobOutput, clock: &impl Clock) -> Self {
        Self {
            id: WorkspaceItemId::new(),
            url: output.url().clone(),
            job_id: job.id(),
            prompt: job.prompt().as_str().to_owned(),
            kind: job.kind(),
            quality: job.quality(),
            model_label: job.model_id().as_str().to_owned(),
            duration_seconds: output.duration_seconds(),
            seed: job.seed(),
            added_at: clock.utc(),
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub const fn id(&self) -> WorkspaceItemId {
        self.id
    }

    /// Returns the output URL, unique within a session.
    #[must_use]
    pub const fn url(&self) -> &AssetUrl {
        &self.url
    }

    /// Returns the originating job.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Returns the prompt copied from the job.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the output modality.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    /// Returns the quality tier the job requested.
    #[must_use]
    pub const fn quality(&self) -> QualityTier {
        self.quality
    }

    /// Returns the label of the model that produced the output.
    #[must_use]
    pub fn model_label(&self) -> &str {
        &self.model_label
    }

    /// Returns the clip duration for video items.
    #[must_use]
    pub const fn duration_seconds(&self) -> Option<u32> {
        self.duration_seconds
    }

    /// Returns the generation seed, if one was set.
    #[must_use]
    pub const fn seed(&self) -> Option<Seed> {
        self.seed
    }

    /// Returns when the item entered the workspace.
    #[must_use]
    pub const fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }
}
