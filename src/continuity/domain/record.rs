//! Tracker entries and the tri-state previous-scene answer.

use super::{SceneId, SceneRecord};
use crate::generation::domain::AssetUrl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The continuity pointer tracked for one conversation.
///
/// A record is either ready, carrying an image, or pending, carrying none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneContinuityRecord {
    scene_id: SceneId,
    image_url: Option<AssetUrl>,
    updated_at: DateTime<Utc>,
}

impl SceneContinuityRecord {
    /// Creates a record for a scene with an image.
    #[must_use]
    pub const fn ready(scene_id: SceneId, image_url: AssetUrl, updated_at: DateTime<Utc>) -> Self {
        Self {
            scene_id,
            image_url: Some(image_url),
            updated_at,
        }
    }

    /// Creates a record for a scene whose image has not been produced yet.
    #[must_use]
    pub const fn pending(scene_id: SceneId, updated_at: DateTime<Utc>) -> Self {
        Self {
            scene_id,
            image_url: None,
            updated_at,
        }
    }

    /// Builds the record matching a stored scene row.
    #[must_use]
    pub fn from_scene(scene: &SceneRecord) -> Self {
        match scene.image_url() {
            Some(url) => Self::ready(scene.id(), url.clone(), scene.updated_at()),
            None => Self::pending(scene.id(), scene.updated_at()),
        }
    }

    /// Returns the scene identifier.
    #[must_use]
    pub const fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    /// Returns the image for ready records.
    #[must_use]
    pub const fn image_url(&self) -> Option<&AssetUrl> {
        self.image_url.as_ref()
    }

    /// Returns whether the image is still missing.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.image_url.is_none()
    }

    /// Returns when the record was last written.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Answer to "what was the previous scene of this conversation?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviousScene {
    /// The conversation has no scene at all.
    Absent,
    /// The latest scene exists but its image is still being generated.
    Pending {
        /// The pending scene.
        scene_id: SceneId,
        /// The most recent scene that does have an image, if any.
        last_ready: Option<SceneContinuityRecord>,
    },
    /// The latest scene has an image.
    Ready(SceneContinuityRecord),
}

impl PreviousScene {
    /// Returns the latest complete scene, whether or not a newer one is
    /// pending.
    #[must_use]
    pub const fn last_ready(&self) -> Option<&SceneContinuityRecord> {
        match self {
            Self::Absent => None,
            Self::Pending { last_ready, .. } => last_ready.as_ref(),
            Self::Ready(record) => Some(record),
        }
    }

    /// Returns whether a scene is waiting for its image.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}
