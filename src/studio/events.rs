//! Notifications broadcast to presentation layers.

use crate::continuity::domain::{ConversationId, SceneContinuityRecord, SceneId};
use crate::generation::domain::{GenerationJob, JobId};
use crate::generation::services::WatchOutcome;
use crate::workspace::domain::{WorkspaceItem, WorkspaceItemId};

/// Where the output of a generation should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationTarget {
    /// Outputs are added to the owner's workspace.
    Workspace,
    /// The first output becomes the image of a conversation scene.
    Scene {
        /// Conversation the scene belongs to.
        conversation_id: ConversationId,
        /// Scene to create; a fresh identifier is used when `None`.
        scene_id: Option<SceneId>,
    },
}

impl GenerationTarget {
    /// Targets a new scene in `conversation_id`.
    #[must_use]
    pub const fn scene(conversation_id: ConversationId) -> Self {
        Self::Scene {
            conversation_id,
            scene_id: None,
        }
    }

    pub(super) const fn label(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Scene { .. } => "scene",
        }
    }
}

/// Event emitted by a [`super::Studio`].
#[derive(Debug, Clone, PartialEq)]
pub enum StudioEvent {
    /// A job reached a new status.
    JobStatusChanged(GenerationJob),
    /// A watch ended.
    WatchFinished {
        /// Watched job.
        job_id: JobId,
        /// How the watch ended.
        outcome: WatchOutcome,
    },
    /// An output was added to the workspace.
    WorkspaceItemAdded(WorkspaceItem),
    /// An item was removed from the workspace.
    WorkspaceItemRemoved(WorkspaceItemId),
    /// The workspace was emptied.
    WorkspaceCleared {
        /// Number of items removed.
        removed: usize,
    },
    /// A conversation's continuity pointer changed.
    SceneContinuityUpdated {
        /// Conversation whose pointer changed.
        conversation_id: ConversationId,
        /// New pointer, or `None` when cleared.
        record: Option<SceneContinuityRecord>,
    },
}
