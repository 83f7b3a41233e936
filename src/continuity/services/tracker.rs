//! Per-conversation pointer to the latest scene image.
//!
//! The tracker caches one [`SceneContinuityRecord`] per conversation, bounded
//! by a configurable cap with least-recently-updated eviction. The scene
//! store is the authority; the cache is back-filled on demand and, when a
//! [`SceneChangeFeed`] is attached, kept fresh by listeners.

use crate::continuity::{
    domain::{
        ContinuityDomainError, ContinuitySeed, ContinuitySettings, ContinuityStrength,
        ConversationId, PreviousScene, SceneContinuityRecord, SceneId, SceneRecord,
    },
    ports::{SceneChangeFeed, SceneRepository, SceneRepositoryError},
};
use crate::generation::domain::{AssetUrl, JobId};
use indexmap::IndexMap;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

const UPDATE_BUFFER: usize = 64;

/// Continuity tracker settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityConfig {
    /// Maximum number of conversations kept in the cache.
    pub max_tracked_conversations: usize,
    /// Whether continuity seeding starts enabled.
    pub enabled: bool,
    /// Initial continuity strength, clamped on load.
    pub strength: ContinuityStrength,
}

impl ContinuityConfig {
    /// Returns the initial user-facing settings.
    #[must_use]
    pub const fn settings(&self) -> ContinuitySettings {
        ContinuitySettings {
            enabled: self.enabled,
            strength: self.strength,
        }
    }
}

impl Default for ContinuityConfig {
    fn default() -> Self {
        Self {
            max_tracked_conversations: 50,
            enabled: true,
            strength: ContinuityStrength::default(),
        }
    }
}

/// Change to a tracked continuity pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityUpdate {
    /// Conversation whose pointer changed.
    pub conversation_id: ConversationId,
    /// The new pointer, or `None` when it was cleared.
    pub record: Option<SceneContinuityRecord>,
}

/// Service-level errors for continuity operations.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ContinuityDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] SceneRepositoryError),
    /// The scene does not exist.
    #[error("scene not found: {0}")]
    NotFound(SceneId),
}

/// Result type for continuity tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

struct TrackerState {
    records: IndexMap<ConversationId, SceneContinuityRecord>,
    settings: ContinuitySettings,
}

struct TrackerInner<R, C> {
    repository: Arc<R>,
    clock: Arc<C>,
    capacity: usize,
    state: RwLock<TrackerState>,
    updates: broadcast::Sender<ContinuityUpdate>,
}

/// Cloneable handle on a session's continuity cache.
pub struct SceneContinuityTracker<R, C>
where
    R: SceneRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    inner: Arc<TrackerInner<R, C>>,
    feed: Option<Arc<dyn SceneChangeFeed>>,
}

impl<R, C> Clone for SceneContinuityTracker<R, C>
where
    R: SceneRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            feed: self.feed.clone(),
        }
    }
}

impl<R, C> SceneContinuityTracker<R, C>
where
    R: SceneRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an empty tracker.
    ///
    /// A cap of zero is treated as one.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>, config: ContinuityConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Self {
            inner: Arc::new(TrackerInner {
                repository,
                clock,
                capacity: config.max_tracked_conversations.max(1),
                state: RwLock::new(TrackerState {
                    records: IndexMap::new(),
                    settings: config.settings(),
                }),
                updates,
            }),
            feed: None,
        }
    }

    /// Attaches a change feed used by [`Self::listen`].
    #[must_use]
    pub fn with_change_feed(mut self, feed: Arc<dyn SceneChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Subscribes to pointer changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ContinuityUpdate> {
        self.inner.updates.subscribe()
    }

    /// Returns the previous scene of a conversation.
    ///
    /// A cached ready pointer is answered from memory. Anything else is
    /// resolved against the store.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the store cannot be read.
    pub async fn get_previous_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> TrackerResult<PreviousScene> {
        let cached = self.cached(conversation_id)?;
        if let Some(record) = cached.filter(|record| !record.is_pending()) {
            return Ok(PreviousScene::Ready(record));
        }
        self.load(conversation_id).await
    }

    /// Re-reads the store for a conversation, bypassing a cached ready
    /// pointer.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the store cannot be read.
    pub async fn refresh(&self, conversation_id: &ConversationId) -> TrackerResult<PreviousScene> {
        self.load(conversation_id).await
    }

    /// Points a conversation at a scene image, replacing any previous
    /// pointer.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the cache lock is poisoned.
    pub fn set_last_scene(
        &self,
        conversation_id: &ConversationId,
        scene_id: SceneId,
        image_url: AssetUrl,
    ) -> TrackerResult<SceneContinuityRecord> {
        let record = SceneContinuityRecord::ready(scene_id, image_url, self.inner.clock.utc());
        self.remember(conversation_id, record.clone())?;
        Ok(record)
    }

    /// Records that a scene of a conversation is waiting for its image.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the cache lock is poisoned.
    pub fn mark_pending(
        &self,
        conversation_id: &ConversationId,
        scene_id: SceneId,
    ) -> TrackerResult<SceneContinuityRecord> {
        let record = SceneContinuityRecord::pending(scene_id, self.inner.clock.utc());
        self.remember(conversation_id, record.clone())?;
        Ok(record)
    }

    /// Forgets the pointer of a conversation.
    ///
    /// Returns whether a pointer was tracked.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the cache lock is poisoned.
    pub fn clear_last_scene(&self, conversation_id: &ConversationId) -> TrackerResult<bool> {
        let removed = self
            .write_state()?
            .records
            .shift_remove(conversation_id)
            .is_some();
        if removed {
            self.publish(ContinuityUpdate {
                conversation_id: conversation_id.clone(),
                record: None,
            });
        }
        Ok(removed)
    }

    /// Returns the tracked conversations, least recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the cache lock is poisoned.
    pub fn tracked_conversations(&self) -> TrackerResult<Vec<ConversationId>> {
        Ok(self.read_state()?.records.keys().cloned().collect())
    }

    /// Returns the current continuity settings.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the cache lock is poisoned.
    pub fn settings(&self) -> TrackerResult<ContinuitySettings> {
        Ok(self.read_state()?.settings)
    }

    /// Enables or disables continuity seeding.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the cache lock is poisoned.
    pub fn set_enabled(&self, enabled: bool) -> TrackerResult<()> {
        self.write_state()?.settings.enabled = enabled;
        Ok(())
    }

    /// Sets the continuity strength and returns the clamped value stored.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the cache lock is poisoned.
    pub fn set_strength(&self, strength: f64) -> TrackerResult<ContinuityStrength> {
        let clamped = ContinuityStrength::new(strength);
        self.write_state()?.settings.strength = clamped;
        Ok(clamped)
    }

    /// Returns the reference image and strength for the next generation in
    /// a conversation.
    ///
    /// While the latest scene is pending, the last complete scene is used.
    /// Returns `None` when continuity is disabled or no complete scene
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the store cannot be read.
    pub async fn seed_for(
        &self,
        conversation_id: &ConversationId,
    ) -> TrackerResult<Option<ContinuitySeed>> {
        let settings = self.settings()?;
        if !settings.enabled {
            return Ok(None);
        }
        let previous = self.get_previous_scene(conversation_id).await?;
        Ok(previous.last_ready().and_then(|record| {
            record.image_url().map(|url| ContinuitySeed {
                scene_id: record.scene_id(),
                image_url: url.clone(),
                strength: settings.strength,
            })
        }))
    }

    /// Stores a pending scene row and marks the conversation pending.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Repository`] when the store rejects the row.
    pub async fn begin_scene(
        &self,
        conversation_id: &ConversationId,
        scene_id: SceneId,
        job_id: Option<JobId>,
    ) -> TrackerResult<SceneRecord> {
        let scene = SceneRecord::pending(
            scene_id,
            conversation_id.clone(),
            job_id,
            &*self.inner.clock,
        );
        self.inner.repository.store(&scene).await?;
        self.mark_pending(conversation_id, scene_id)?;
        Ok(scene)
    }

    /// Attaches a generated image to a stored scene and points its
    /// conversation at it.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for unknown scenes,
    /// [`TrackerError::Domain`] when the scene already has an image and
    /// [`TrackerError::Repository`] for persistence failures.
    pub async fn complete_scene(
        &self,
        scene_id: SceneId,
        image_url: AssetUrl,
    ) -> TrackerResult<SceneContinuityRecord> {
        let mut scene = self
            .inner
            .repository
            .find_by_id(scene_id)
            .await?
            .ok_or(TrackerError::NotFound(scene_id))?;
        scene.attach_image(image_url, &*self.inner.clock)?;
        self.inner.repository.update(&scene).await?;
        let record = SceneContinuityRecord::from_scene(&scene);
        self.remember(scene.conversation_id(), record.clone())?;
        Ok(record)
    }

    /// Drops a scene whose image will never arrive and points its
    /// conversation back at the latest scene still in the store.
    ///
    /// Returns the conversation's previous scene after the drop. Scenes
    /// already deleted are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Domain`] when the scene already has an image
    /// and [`TrackerError::Repository`] for persistence failures.
    pub async fn abandon_scene(
        &self,
        conversation_id: &ConversationId,
        scene_id: SceneId,
    ) -> TrackerResult<PreviousScene> {
        if let Some(scene) = self.inner.repository.find_by_id(scene_id).await? {
            if !scene.is_pending() {
                return Err(ContinuityDomainError::ImageAlreadyAttached(scene_id).into());
            }
            self.inner.repository.delete(scene_id).await?;
        }
        let forgotten = {
            let mut state = self.write_state()?;
            let points_here = state
                .records
                .get(conversation_id)
                .is_some_and(|record| record.scene_id() == scene_id);
            points_here && state.records.shift_remove(conversation_id).is_some()
        };
        let previous = self.load(conversation_id).await?;
        if forgotten && previous == PreviousScene::Absent {
            self.publish(ContinuityUpdate {
                conversation_id: conversation_id.clone(),
                record: None,
            });
        }
        tracing::info!(
            conversation_id = %conversation_id,
            scene_id = %scene_id,
            "abandoned scene without an image"
        );
        Ok(previous)
    }

    /// Follows scene writes for one conversation until the listener is
    /// dropped.
    ///
    /// Returns `None` when no change feed is attached. Writes that attach
    /// an image replace the pointer unless a newer ready pointer is already
    /// cached.
    #[must_use]
    pub fn listen(&self, conversation_id: ConversationId) -> Option<ContinuityListener> {
        let receiver = self.feed.as_ref()?.subscribe();
        let token = CancellationToken::new();
        let tracker = self.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            tracker.follow(&conversation_id, receiver, &task_token).await;
        });
        Some(ContinuityListener {
            guard: token.clone().drop_guard(),
            token,
            handle,
        })
    }

    async fn follow(
        &self,
        conversation_id: &ConversationId,
        mut receiver: broadcast::Receiver<SceneRecord>,
        token: &CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                () = token.cancelled() => return,
                received = receiver.recv() => received,
            };
            match received {
                Ok(scene) if scene.conversation_id() == conversation_id => {
                    if let Err(err) = self.apply_change(&scene) {
                        tracing::warn!(
                            conversation_id = %conversation_id,
                            error = %err,
                            "failed to apply scene change"
                        );
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        conversation_id = %conversation_id,
                        skipped,
                        "scene listener lagged, re-reading store"
                    );
                    if let Err(err) = self.load(conversation_id).await {
                        tracing::warn!(
                            conversation_id = %conversation_id,
                            error = %err,
                            "scene listener refresh failed"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    fn apply_change(&self, scene: &SceneRecord) -> TrackerResult<()> {
        if scene.is_pending() {
            return Ok(());
        }
        let record = SceneContinuityRecord::from_scene(scene);
        let cached = self.cached(scene.conversation_id())?;
        let superseded = cached.is_some_and(|current| {
            !current.is_pending()
                && current.scene_id() != record.scene_id()
                && current.updated_at() > record.updated_at()
        });
        if superseded {
            return Ok(());
        }
        self.remember(scene.conversation_id(), record)
    }

    async fn load(&self, conversation_id: &ConversationId) -> TrackerResult<PreviousScene> {
        let cached = self.cached(conversation_id)?;
        let latest = self.inner.repository.latest_scene(conversation_id).await?;

        let Some(scene) = latest else {
            return Ok(match cached {
                Some(record) if record.is_pending() => PreviousScene::Pending {
                    scene_id: record.scene_id(),
                    last_ready: None,
                },
                Some(record) => PreviousScene::Ready(record),
                None => PreviousScene::Absent,
            });
        };

        if scene.is_pending() {
            let stored_ready = self
                .inner
                .repository
                .latest_ready_scene(conversation_id)
                .await?
                .map(|ready| SceneContinuityRecord::from_scene(&ready));
            let last_ready =
                stored_ready.or_else(|| cached.filter(|record| !record.is_pending()));
            self.remember(conversation_id, SceneContinuityRecord::from_scene(&scene))?;
            return Ok(PreviousScene::Pending {
                scene_id: scene.id(),
                last_ready,
            });
        }

        let record = SceneContinuityRecord::from_scene(&scene);
        if let Some(pending) = cached.filter(|current| {
            current.is_pending() && current.updated_at() > record.updated_at()
        }) {
            return Ok(PreviousScene::Pending {
                scene_id: pending.scene_id(),
                last_ready: Some(record),
            });
        }
        self.remember(conversation_id, record.clone())?;
        Ok(PreviousScene::Ready(record))
    }

    fn cached(
        &self,
        conversation_id: &ConversationId,
    ) -> TrackerResult<Option<SceneContinuityRecord>> {
        Ok(self.read_state()?.records.get(conversation_id).cloned())
    }

    fn remember(
        &self,
        conversation_id: &ConversationId,
        record: SceneContinuityRecord,
    ) -> TrackerResult<()> {
        let evicted = {
            let mut state = self.write_state()?;
            if state.records.get(conversation_id) == Some(&record) {
                return Ok(());
            }
            state.records.shift_remove(conversation_id);
            state.records.insert(conversation_id.clone(), record.clone());
            let mut dropped = Vec::new();
            while state.records.len() > self.inner.capacity {
                if let Some((oldest, _)) = state.records.shift_remove_index(0) {
                    dropped.push(oldest);
                }
            }
            dropped
        };
        for oldest in evicted {
            tracing::debug!(conversation_id = %oldest, "evicted continuity pointer");
        }
        self.publish(ContinuityUpdate {
            conversation_id: conversation_id.clone(),
            record: Some(record),
        });
        Ok(())
    }

    fn publish(&self, update: ContinuityUpdate) {
        if self.inner.updates.send(update).is_err() {
            tracing::trace!("no continuity subscribers");
        }
    }

    fn read_state(&self) -> TrackerResult<RwLockReadGuard<'_, TrackerState>> {
        self.inner.state.read().map_err(|err| {
            SceneRepositoryError::persistence(std::io::Error::other(err.to_string())).into()
        })
    }

    fn write_state(&self) -> TrackerResult<RwLockWriteGuard<'_, TrackerState>> {
        self.inner.state.write().map_err(|err| {
            SceneRepositoryError::persistence(std::io::Error::other(err.to_string())).into()
        })
    }
}

/// Handle on a running continuity listener.
///
/// Dropping the handle stops the listener.
#[derive(Debug)]
pub struct ContinuityListener {
    token: CancellationToken,
    guard: DropGuard,
    handle: JoinHandle<()>,
}

impl ContinuityListener {
    /// Stops the listener.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns whether the listener is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the listener and waits for it to exit.
    pub async fn shutdown(self) {
        let Self { token, guard, handle } = self;
        token.cancel();
        if let Err(err) = handle.await {
            tracing::warn!(error = %err, "continuity listener ended abnormally");
        }
        drop(guard.disarm());
    }
}
