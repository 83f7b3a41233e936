//! In-memory scene repository with a broadcast change feed.

use crate::continuity::{
    domain::{ConversationId, SceneId, SceneRecord},
    ports::{SceneChangeFeed, SceneRepository, SceneRepositoryError, SceneRepositoryResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const CHANGE_FEED_CAPACITY: usize = 256;

/// Thread-safe in-memory scene repository.
#[derive(Debug, Clone)]
pub struct InMemorySceneRepository {
    scenes: Arc<RwLock<HashMap<SceneId, SceneRecord>>>,
    changes: broadcast::Sender<SceneRecord>,
}

impl InMemorySceneRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            scenes: Arc::new(RwLock::new(HashMap::new())),
            changes,
        }
    }

    fn latest_matching(
        &self,
        conversation_id: &ConversationId,
        ready_only: bool,
    ) -> SceneRepositoryResult<Option<SceneRecord>> {
        let scenes = self.scenes.read().map_err(|err| {
            SceneRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(scenes
            .values()
            .filter(|scene| scene.conversation_id() == conversation_id)
            .filter(|scene| !ready_only || !scene.is_pending())
            .max_by_key(|scene| scene.created_at())
            .cloned())
    }

    fn publish(&self, scene: &SceneRecord) {
        if self.changes.send(scene.clone()).is_err() {
            tracing::trace!(scene_id = %scene.id(), "no scene change subscribers");
        }
    }
}

impl Default for InMemorySceneRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SceneRepository for InMemorySceneRepository {
    async fn store(&self, scene: &SceneRecord) -> SceneRepositoryResult<()> {
        {
            let mut scenes = self.scenes.write().map_err(|err| {
                SceneRepositoryError::persistence(std::io::Error::other(err.to_string()))
            })?;
            if scenes.contains_key(&scene.id()) {
                return Err(SceneRepositoryError::DuplicateScene(scene.id()));
            }
            scenes.insert(scene.id(), scene.clone());
        }
        self.publish(scene);
        Ok(())
    }

    async fn update(&self, scene: &SceneRecord) -> SceneRepositoryResult<()> {
        {
            let mut scenes = self.scenes.write().map_err(|err| {
                SceneRepositoryError::persistence(std::io::Error::other(err.to_string()))
            })?;
            let stored = scenes
                .get_mut(&scene.id())
                .ok_or(SceneRepositoryError::NotFound(scene.id()))?;
            *stored = scene.clone();
        }
        self.publish(scene);
        Ok(())
    }

    async fn delete(&self, id: SceneId) -> SceneRepositoryResult<bool> {
        let mut scenes = self.scenes.write().map_err(|err| {
            SceneRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(scenes.remove(&id).is_some())
    }

    async fn find_by_id(&self, id: SceneId) -> SceneRepositoryResult<Option<SceneRecord>> {
        let scenes = self.scenes.read().map_err(|err| {
            SceneRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(scenes.get(&id).cloned())
    }

    async fn latest_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> SceneRepositoryResult<Option<SceneRecord>> {
        self.latest_matching(conversation_id, false)
    }

    async fn latest_ready_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> SceneRepositoryResult<Option<SceneRecord>> {
        self.latest_matching(conversation_id, true)
    }
}

impl SceneChangeFeed for InMemorySceneRepository {
    fn subscribe(&self) -> broadcast::Receiver<SceneRecord> {
        self.changes.subscribe()
    }
}
