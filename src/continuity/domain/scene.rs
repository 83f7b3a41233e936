//! Scene rows as stored in the backing store.

use super::{ContinuityDomainError, ConversationId, SceneId};
use crate::generation::domain::{AssetUrl, JobId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A scene of a conversation and, once generated, its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRecord {
    id: SceneId,
    conversation_id: ConversationId,
    job_id: Option<JobId>,
    image_url: Option<AssetUrl>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSceneData {
    /// Persisted scene identifier.
    pub id: SceneId,
    /// Persisted conversation.
    pub conversation_id: ConversationId,
    /// Job generating the scene image.
    pub job_id: Option<JobId>,
    /// Persisted image URL.
    pub image_url: Option<AssetUrl>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SceneRecord {
    /// Creates a scene whose image is still being generated.
    #[must_use]
    pub fn pending(
        id: SceneId,
        conversation_id: ConversationId,
        job_id: Option<JobId>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id,
            conversation_id,
            job_id,
            image_url: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a scene from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSceneData) -> Self {
        Self {
            id: data.id,
            conversation_id: data.conversation_id,
            job_id: data.job_id,
            image_url: data.image_url,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the scene identifier.
    #[must_use]
    pub const fn id(&self) -> SceneId {
        self.id
    }

    /// Returns the owning conversation.
    #[must_use]
    pub const fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Returns the job generating the image, if known.
    #[must_use]
    pub const fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    /// Returns the scene image once generated.
    #[must_use]
    pub const fn image_url(&self) -> Option<&AssetUrl> {
        self.image_url.as_ref()
    }

    /// Returns whether the image is still missing.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.image_url.is_none()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Attaches the generated image.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuityDomainError::ImageAlreadyAttached`] when the scene
    /// already has an image.
    pub fn attach_image(
        &mut self,
        image_url: AssetUrl,
        clock: &impl Clock,
    ) -> Result<(), ContinuityDomainError> {
        if self.image_url.is_some() {
            return Err(ContinuityDomainError::ImageAlreadyAttached(self.id));
        }
        self.image_url = Some(image_url);
        self.updated_at = clock.utc();
        Ok(())
    }
}
