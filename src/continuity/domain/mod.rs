//! Domain model for scene continuity.
//!
//! Scenes belong to a conversation. A scene row may exist before its image
//! has been generated; the tracker distinguishes that pending state from
//! the absence of any scene.

mod error;
mod ids;
mod record;
mod scene;
mod settings;

pub use error::ContinuityDomainError;
pub use ids::{ConversationId, SceneId};
pub use record::{PreviousScene, SceneContinuityRecord};
pub use scene::{PersistedSceneData, SceneRecord};
pub use settings::{
    ContinuitySeed, ContinuitySettings, ContinuityStrength, MAX_CONTINUITY_STRENGTH,
    MIN_CONTINUITY_STRENGTH,
};
