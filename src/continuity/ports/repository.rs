//! Repository port for scene persistence and lookup.

use crate::continuity::domain::{ConversationId, SceneId, SceneRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for scene repository operations.
pub type SceneRepositoryResult<T> = Result<T, SceneRepositoryError>;

/// Scene persistence contract.
#[async_trait]
pub trait SceneRepository: Send + Sync {
    /// Stores a new scene.
    ///
    /// # Errors
    ///
    /// Returns [`SceneRepositoryError::DuplicateScene`] when the scene ID
    /// already exists.
    async fn store(&self, scene: &SceneRecord) -> SceneRepositoryResult<()>;

    /// Persists changes to an existing scene.
    ///
    /// # Errors
    ///
    /// Returns [`SceneRepositoryError::NotFound`] when the scene does not
    /// exist.
    async fn update(&self, scene: &SceneRecord) -> SceneRepositoryResult<()>;

    /// Deletes a scene, returning whether it existed.
    async fn delete(&self, id: SceneId) -> SceneRepositoryResult<bool>;

    /// Finds a scene by identifier.
    async fn find_by_id(&self, id: SceneId) -> SceneRepositoryResult<Option<SceneRecord>>;

    /// Returns the most recently created scene of a conversation, pending or
    /// not.
    async fn latest_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> SceneRepositoryResult<Option<SceneRecord>>;

    /// Returns the most recently created scene of a conversation that has an
    /// image.
    async fn latest_ready_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> SceneRepositoryResult<Option<SceneRecord>>;
}

/// Errors returned by scene repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SceneRepositoryError {
    /// A scene with the same identifier already exists.
    #[error("duplicate scene identifier: {0}")]
    DuplicateScene(SceneId),

    /// The scene was not found.
    #[error("scene not found: {0}")]
    NotFound(SceneId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted scene data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SceneRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
