//! The studio facade: one owner's generation session.

use super::{GenerationTarget, StudioError, StudioEvent, StudioResult};
use crate::config::StudioConfig;
use crate::continuity::{
    domain::{
        ContinuitySettings, ContinuityStrength, ConversationId, PreviousScene,
        SceneContinuityRecord, SceneId,
    },
    ports::{SceneChangeFeed, SceneRepository},
    services::{ContinuityListener, ContinuityUpdate, SceneContinuityTracker},
};
use crate::gateway::{
    domain::ModelCatalog,
    ports::{GenerationProvider, ProviderPrediction},
    services::{CallbackOutcome, GenerationGateway, ProviderCallbackService},
};
use crate::generation::{
    domain::{
        AssetUrl, GenerationJob, GenerationRequest, JobFailure, JobId, JobStatus, JobTransition,
        OwnerId,
    },
    ports::{JobChangeFeed, JobRepository},
    services::{JobLifecycleService, JobWatch, JobWatcher, RequestNormalizer, WatchOutcome},
};
use crate::workspace::{
    domain::{WorkspaceItem, WorkspaceItemId},
    ports::SessionStorage,
    services::{AddOutcome, PersistenceStatus, WorkspaceCache},
};
use mockable::Clock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::{CancellationToken, DropGuard};

const EVENT_BUFFER: usize = 128;

/// Metadata key naming where a job's output goes.
pub const DESTINATION_METADATA_KEY: &str = "destination";
/// Metadata key carrying the conversation of a scene job.
pub const CONVERSATION_METADATA_KEY: &str = "conversation_id";
/// Metadata key carrying the scene of a scene job.
pub const SCENE_METADATA_KEY: &str = "scene_id";

type WatchRegistry = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

/// Infrastructure a studio runs on.
pub struct StudioPorts<R, S, N, P> {
    /// Job store.
    pub jobs: Arc<R>,
    /// Optional push notifications for job writes.
    pub job_feed: Option<Arc<dyn JobChangeFeed>>,
    /// Session storage backing the workspace.
    pub storage: Arc<S>,
    /// Scene store.
    pub scenes: Arc<N>,
    /// Optional push notifications for scene writes.
    pub scene_feed: Option<Arc<dyn SceneChangeFeed>>,
    /// Generation provider.
    pub provider: Arc<P>,
}

/// Result of [`Studio::submit_generation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The job after submission. A provider rejection shows up here as a
    /// `failed` job.
    pub job: GenerationJob,
    /// Scene created for scene targets.
    pub scene_id: Option<SceneId>,
    /// Whether a watch now follows the job.
    pub watching: bool,
}

/// One owner's session over generation, workspace and scene continuity.
///
/// Every observable change is broadcast as a [`StudioEvent`]; callers
/// subscribe with [`Studio::subscribe`].
pub struct Studio<R, S, N, P, C>
where
    R: JobRepository + 'static,
    S: SessionStorage + 'static,
    N: SceneRepository + 'static,
    P: GenerationProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    owner_id: OwnerId,
    normalizer: RequestNormalizer,
    lifecycle: JobLifecycleService<R, C>,
    watcher: JobWatcher<R>,
    gateway: GenerationGateway<R, C, P>,
    callbacks: ProviderCallbackService<R, C, P>,
    workspace: Arc<WorkspaceCache<S, C>>,
    continuity: SceneContinuityTracker<N, C>,
    events: broadcast::Sender<StudioEvent>,
    watches: WatchRegistry,
    _forwarder: DropGuard,
}

impl<R, S, N, P, C> Studio<R, S, N, P, C>
where
    R: JobRepository + 'static,
    S: SessionStorage + 'static,
    N: SceneRepository + 'static,
    P: GenerationProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Opens a session for `owner_id`, restoring its workspace.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn open(
        owner_id: OwnerId,
        ports: StudioPorts<R, S, N, P>,
        clock: Arc<C>,
        catalog: Arc<ModelCatalog>,
        config: &StudioConfig,
    ) -> Self {
        let StudioPorts {
            jobs,
            job_feed,
            storage,
            scenes,
            scene_feed,
            provider,
        } = ports;

        let lifecycle = JobLifecycleService::new(Arc::clone(&jobs), Arc::clone(&clock));
        let mut watcher = JobWatcher::new(jobs, config.watch);
        if let Some(feed) = job_feed {
            watcher = watcher.with_change_feed(feed);
        }
        let gateway = GenerationGateway::new(
            lifecycle.clone(),
            Arc::clone(&provider),
            Arc::clone(&catalog),
            config.retry,
        );
        let callbacks = ProviderCallbackService::new(lifecycle.clone(), provider, catalog);
        let workspace = Arc::new(
            WorkspaceCache::open(owner_id, storage, Arc::clone(&clock), config.workspace).await,
        );
        let mut continuity = SceneContinuityTracker::new(scenes, clock, config.continuity);
        if let Some(feed) = scene_feed {
            continuity = continuity.with_change_feed(feed);
        }

        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let forwarder = CancellationToken::new();
        tokio::spawn(forward_continuity(
            continuity.subscribe(),
            events.clone(),
            forwarder.clone(),
        ));

        tracing::info!(owner_id = %owner_id, "studio session opened");
        Self {
            owner_id,
            normalizer: RequestNormalizer::new(config.default_models.clone()),
            lifecycle,
            watcher,
            gateway,
            callbacks,
            workspace,
            continuity,
            events,
            watches: Arc::new(Mutex::new(HashMap::new())),
            _forwarder: forwarder.drop_guard(),
        }
    }

    /// Returns the session owner.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Subscribes to studio events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.events.subscribe()
    }

    /// Creates, submits and watches a generation job.
    ///
    /// Scene targets without an explicit reference image are seeded from
    /// the conversation's last complete scene when continuity is enabled.
    /// Once the job completes its outputs are imported into the workspace,
    /// or attached to the scene for scene targets.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Validation`] when the request is rejected
    /// (no job is created), [`StudioError::Lifecycle`] when the job cannot
    /// be stored, [`StudioError::Continuity`] when the scene row cannot be
    /// stored and [`StudioError::Gateway`] when the model is unknown or its
    /// rules reject the parameters. In the last two cases the job is marked
    /// `failed` before returning.
    pub async fn submit_generation(
        &self,
        request: GenerationRequest,
        target: GenerationTarget,
    ) -> StudioResult<Submission> {
        let scene = match &target {
            GenerationTarget::Workspace => None,
            GenerationTarget::Scene {
                conversation_id,
                scene_id,
            } => Some((conversation_id.clone(), scene_id.unwrap_or_default())),
        };
        let seeded_request = match &scene {
            Some((conversation_id, _)) if !request.has_reference_image() => {
                self.seed(request, conversation_id).await
            }
            _ => request,
        };

        let mut params = self.normalizer.normalize(seeded_request)?;
        params
            .metadata
            .insert(DESTINATION_METADATA_KEY, target.label());
        if let Some((conversation_id, scene_id)) = &scene {
            params
                .metadata
                .insert(CONVERSATION_METADATA_KEY, conversation_id.as_str());
            params
                .metadata
                .insert(SCENE_METADATA_KEY, scene_id.to_string());
        }

        let job = self.lifecycle.create_job(self.owner_id, params).await?;
        self.publish(StudioEvent::JobStatusChanged(job.clone()));

        if let Some((conversation_id, scene_id)) = &scene {
            if let Err(err) = self
                .continuity
                .begin_scene(conversation_id, *scene_id, Some(job.id()))
                .await
            {
                self.abandon(job.id(), &err).await;
                return Err(err.into());
            }
        }

        let submitted = match self.gateway.submit(job.id()).await {
            Ok(submitted) => submitted,
            Err(err) => {
                self.rejected(job.id(), scene.as_ref()).await;
                return Err(err.into());
            }
        };

        let scene_id = scene.as_ref().map(|(_, scene_id)| *scene_id);
        let watching = submitted.status() != JobStatus::Failed;
        if watching {
            self.start_watch(submitted.id(), scene)?;
        } else {
            self.publish(StudioEvent::JobStatusChanged(submitted.clone()));
            self.delivery().settle(&submitted, scene.as_ref()).await;
        }
        Ok(Submission {
            job: submitted,
            scene_id,
            watching,
        })
    }

    /// Stops watching a job. The job itself is left untouched.
    ///
    /// Returns whether a watch was running.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::RegistryPoisoned`] when a watch task panicked
    /// while holding the registry.
    pub fn cancel_watch(&self, job_id: JobId) -> StudioResult<bool> {
        let Some(token) = self.registry()?.remove(&job_id) else {
            return Ok(false);
        };
        token.cancel();
        tracing::info!(job_id = %job_id, "job watch cancelled");
        Ok(true)
    }

    /// Returns the jobs currently being watched.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::RegistryPoisoned`] when a watch task panicked
    /// while holding the registry.
    pub fn watched_jobs(&self) -> StudioResult<Vec<JobId>> {
        Ok(self.registry()?.keys().copied().collect())
    }

    /// Adds the outputs of a completed job to the workspace.
    ///
    /// Returns the items that were new; outputs already present are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::JobNotFound`] for unknown jobs and
    /// [`StudioError::Workspace`] when the job has not completed.
    pub async fn import_job_to_workspace(&self, job_id: JobId) -> StudioResult<Vec<WorkspaceItem>> {
        let job = self
            .lifecycle
            .get_job(job_id)
            .await?
            .ok_or(StudioError::JobNotFound(job_id))?;
        let outcomes = self.workspace.import_job(&job)?;
        Ok(publish_added(&self.events, outcomes))
    }

    /// Removes an item from the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Workspace`] when the workspace state is
    /// unavailable.
    pub fn remove_from_workspace(
        &self,
        item_id: WorkspaceItemId,
    ) -> StudioResult<Option<WorkspaceItem>> {
        let removed = self.workspace.remove(item_id)?;
        if removed.is_some() {
            self.publish(StudioEvent::WorkspaceItemRemoved(item_id));
        }
        Ok(removed)
    }

    /// Empties the workspace, returning how many items were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Workspace`] when the workspace state is
    /// unavailable.
    pub fn clear_workspace(&self) -> StudioResult<usize> {
        let removed = self.workspace.clear()?;
        self.publish(StudioEvent::WorkspaceCleared { removed });
        Ok(removed)
    }

    /// Returns the workspace items, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Workspace`] when the workspace state is
    /// unavailable.
    pub fn workspace_items(&self) -> StudioResult<Vec<WorkspaceItem>> {
        Ok(self.workspace.list()?)
    }

    /// Follows the durability of the workspace.
    #[must_use]
    pub fn workspace_persistence(&self) -> watch::Receiver<PersistenceStatus> {
        self.workspace.persistence_status()
    }

    /// Returns the previous scene of a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Continuity`] when the scene store fails.
    pub async fn get_previous_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> StudioResult<PreviousScene> {
        Ok(self.continuity.get_previous_scene(conversation_id).await?)
    }

    /// Points a conversation at a scene image.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Continuity`] when the cache is unavailable.
    pub fn set_last_scene(
        &self,
        conversation_id: &ConversationId,
        scene_id: SceneId,
        image_url: AssetUrl,
    ) -> StudioResult<SceneContinuityRecord> {
        Ok(self
            .continuity
            .set_last_scene(conversation_id, scene_id, image_url)?)
    }

    /// Re-reads a conversation's latest scene from the store.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Continuity`] when the scene store fails.
    pub async fn refresh_scene_from_db(
        &self,
        conversation_id: &ConversationId,
    ) -> StudioResult<PreviousScene> {
        Ok(self.continuity.refresh(conversation_id).await?)
    }

    /// Applies scene writes for a conversation as they happen.
    ///
    /// Returns `None` when no scene change feed was provided.
    #[must_use]
    pub fn follow_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Option<ContinuityListener> {
        self.continuity.listen(conversation_id)
    }

    /// Returns the continuity settings.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Continuity`] when the cache is unavailable.
    pub fn continuity_settings(&self) -> StudioResult<ContinuitySettings> {
        Ok(self.continuity.settings()?)
    }

    /// Turns continuity seeding on or off.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Continuity`] when the cache is unavailable.
    pub fn set_continuity_enabled(&self, enabled: bool) -> StudioResult<()> {
        Ok(self.continuity.set_enabled(enabled)?)
    }

    /// Sets the continuity strength, returning the clamped value.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Continuity`] when the cache is unavailable.
    pub fn set_continuity_strength(&self, strength: f64) -> StudioResult<ContinuityStrength> {
        Ok(self.continuity.set_strength(strength)?)
    }

    /// Applies a prediction pushed by the provider's webhook.
    ///
    /// A running watch picks the change up on its next read. When no watch
    /// follows the job any more, a job settled here is broadcast and its
    /// outputs delivered to the destination recorded at submission.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Gateway`] when no job carries the handle or
    /// the job store fails.
    pub async fn handle_provider_callback(
        &self,
        prediction: ProviderPrediction,
    ) -> StudioResult<CallbackOutcome> {
        let outcome = self.callbacks.handle(prediction).await?;
        self.settle_unwatched(&outcome).await?;
        Ok(outcome)
    }

    /// Asks the provider for a job's state when callbacks went missing.
    ///
    /// Settled jobs nobody watches are delivered as for
    /// [`Self::handle_provider_callback`].
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Gateway`] when the job has no provider handle
    /// or the status check fails.
    pub async fn reconcile_job(&self, job_id: JobId) -> StudioResult<CallbackOutcome> {
        let outcome = self.callbacks.reconcile(job_id).await?;
        self.settle_unwatched(&outcome).await?;
        Ok(outcome)
    }

    /// Stops every watch and flushes the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Workspace`] when the final write fails.
    pub async fn close(&self) -> StudioResult<()> {
        self.cancel_all_watches()?;
        self.workspace.close().await?;
        tracing::info!(owner_id = %self.owner_id, "studio session closed");
        Ok(())
    }

    /// Ends the session on sign-out, discarding the stored workspace.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Workspace`] when stored keys cannot be
    /// removed.
    pub async fn sign_out(&self) -> StudioResult<()> {
        self.cancel_all_watches()?;
        self.workspace.end_session().await?;
        tracing::info!(owner_id = %self.owner_id, "studio session ended");
        Ok(())
    }

    async fn seed(
        &self,
        request: GenerationRequest,
        conversation_id: &ConversationId,
    ) -> GenerationRequest {
        let seed = match self.continuity.seed_for(conversation_id).await {
            Ok(Some(seed)) => seed,
            Ok(None) => return request,
            Err(err) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %err,
                    "continuity lookup failed; generating without a reference"
                );
                return request;
            }
        };
        tracing::debug!(
            conversation_id = %conversation_id,
            scene_id = %seed.scene_id,
            "seeding generation from previous scene"
        );
        let seeded = request.with_reference_image(seed.image_url.as_str());
        if seeded.strength.is_some() {
            seeded
        } else {
            seeded.with_strength(seed.strength.value())
        }
    }

    fn start_watch(
        &self,
        job_id: JobId,
        scene: Option<(ConversationId, SceneId)>,
    ) -> StudioResult<()> {
        let watch = self.watcher.watch(job_id);
        self.registry()?
            .insert(job_id, watch.cancellation_token());
        let follower = WatchFollower {
            delivery: self.delivery(),
            scene,
            watches: Arc::clone(&self.watches),
        };
        tokio::spawn(follower.follow(watch));
        Ok(())
    }

    async fn settle_unwatched(&self, outcome: &CallbackOutcome) -> StudioResult<()> {
        let CallbackOutcome::Applied(job) = outcome else {
            return Ok(());
        };
        let watched = self.registry()?.contains_key(&job.id());
        if watched {
            return Ok(());
        }
        self.publish(StudioEvent::JobStatusChanged(job.clone()));
        let metadata = &job.params().metadata;
        let scene = scene_target(job);
        if scene.is_some()
            || metadata.get_str(DESTINATION_METADATA_KEY)
                == Some(GenerationTarget::Workspace.label())
        {
            self.delivery().settle(job, scene.as_ref()).await;
        }
        Ok(())
    }

    fn delivery(&self) -> Delivery<S, N, C> {
        Delivery {
            workspace: Arc::clone(&self.workspace),
            continuity: self.continuity.clone(),
            events: self.events.clone(),
        }
    }

    async fn abandon(&self, job_id: JobId, reason: &impl fmt::Display) {
        match self.fail_job(job_id, reason.to_string()).await {
            Ok(job) => self.publish(StudioEvent::JobStatusChanged(job)),
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "failed to mark abandoned job");
            }
        }
    }

    async fn fail_job(&self, job_id: JobId, message: String) -> StudioResult<GenerationJob> {
        let failure = JobFailure::from_message(message)?;
        Ok(self
            .lifecycle
            .update_status(job_id, JobTransition::Failed { failure })
            .await?)
    }

    async fn rejected(&self, job_id: JobId, scene: Option<&(ConversationId, SceneId)>) {
        self.publish_current(job_id).await;
        if let Some((conversation_id, scene_id)) = scene {
            self.delivery()
                .abandon_scene(job_id, conversation_id, *scene_id)
                .await;
        }
    }

    async fn publish_current(&self, job_id: JobId) {
        match self.lifecycle.get_job(job_id).await {
            Ok(Some(job)) => self.publish(StudioEvent::JobStatusChanged(job)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "failed to reload rejected job");
            }
        }
    }

    fn cancel_all_watches(&self) -> StudioResult<()> {
        for (_, token) in self.registry()?.drain() {
            token.cancel();
        }
        Ok(())
    }

    fn registry(&self) -> StudioResult<MutexGuard<'_, HashMap<JobId, CancellationToken>>> {
        self.watches
            .lock()
            .map_err(|_| StudioError::RegistryPoisoned)
    }

    fn publish(&self, event: StudioEvent) {
        publish(&self.events, event);
    }
}

/// Routes a settled job's outputs to where they were meant to go.
struct Delivery<S, N, C>
where
    S: SessionStorage + 'static,
    N: SceneRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    workspace: Arc<WorkspaceCache<S, C>>,
    continuity: SceneContinuityTracker<N, C>,
    events: broadcast::Sender<StudioEvent>,
}

impl<S, N, C> Delivery<S, N, C>
where
    S: SessionStorage + 'static,
    N: SceneRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Imports completed workspace jobs, attaches completed scene images
    /// and drops the scenes of failed jobs.
    async fn settle(&self, job: &GenerationJob, scene: Option<&(ConversationId, SceneId)>) {
        match (job.status(), scene) {
            (JobStatus::Completed, None) => self.import(job),
            (JobStatus::Completed, Some((conversation_id, scene_id))) => {
                match job.outputs().first() {
                    Some(output) => {
                        let image_url = output.url().clone();
                        self.complete_scene(job, conversation_id, *scene_id, image_url)
                            .await;
                    }
                    None => {
                        self.abandon_scene(job.id(), conversation_id, *scene_id)
                            .await;
                    }
                }
            }
            (JobStatus::Failed, Some((conversation_id, scene_id))) => {
                self.abandon_scene(job.id(), conversation_id, *scene_id)
                    .await;
            }
            _ => {}
        }
    }

    fn import(&self, job: &GenerationJob) {
        match self.workspace.import_job(job) {
            Ok(outcomes) => {
                publish_added(&self.events, outcomes);
            }
            Err(err) => {
                tracing::warn!(job_id = %job.id(), error = %err, "failed to import job outputs");
            }
        }
    }

    async fn complete_scene(
        &self,
        job: &GenerationJob,
        conversation_id: &ConversationId,
        scene_id: SceneId,
        image_url: AssetUrl,
    ) {
        if let Err(err) = self.continuity.complete_scene(scene_id, image_url).await {
            tracing::warn!(
                job_id = %job.id(),
                conversation_id = %conversation_id,
                scene_id = %scene_id,
                error = %err,
                "failed to attach image to scene"
            );
        }
    }

    async fn abandon_scene(
        &self,
        job_id: JobId,
        conversation_id: &ConversationId,
        scene_id: SceneId,
    ) {
        if let Err(err) = self
            .continuity
            .abandon_scene(conversation_id, scene_id)
            .await
        {
            tracing::warn!(
                job_id = %job_id,
                conversation_id = %conversation_id,
                scene_id = %scene_id,
                error = %err,
                "failed to drop scene of failed job"
            );
        }
    }
}

struct WatchFollower<S, N, C>
where
    S: SessionStorage + 'static,
    N: SceneRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    delivery: Delivery<S, N, C>,
    scene: Option<(ConversationId, SceneId)>,
    watches: WatchRegistry,
}

impl<S, N, C> WatchFollower<S, N, C>
where
    S: SessionStorage + 'static,
    N: SceneRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn follow(self, mut watch: JobWatch) {
        let job_id = watch.job_id();
        let events = &self.delivery.events;
        while let Some(event) = watch.next_event().await {
            publish(events, StudioEvent::JobStatusChanged(event.job));
        }
        let outcome = watch.outcome().await;
        if let WatchOutcome::Completed(job) | WatchOutcome::Failed(job) = &outcome {
            self.delivery.settle(job, self.scene.as_ref()).await;
        }
        match self.watches.lock() {
            Ok(mut watches) => {
                watches.remove(&job_id);
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "watch registry poisoned");
            }
        }
        publish(events, StudioEvent::WatchFinished { job_id, outcome });
    }
}

/// Reads the scene a job was submitted for from its metadata.
fn scene_target(job: &GenerationJob) -> Option<(ConversationId, SceneId)> {
    let metadata = &job.params().metadata;
    let conversation_id = metadata
        .get_str(CONVERSATION_METADATA_KEY)
        .and_then(|raw| ConversationId::new(raw).ok())?;
    let scene_id = metadata.get_uuid(SCENE_METADATA_KEY).map(SceneId::from_uuid)?;
    Some((conversation_id, scene_id))
}

async fn forward_continuity(
    mut updates: broadcast::Receiver<ContinuityUpdate>,
    events: broadcast::Sender<StudioEvent>,
    token: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            () = token.cancelled() => return,
            received = updates.recv() => received,
        };
        match received {
            Ok(ContinuityUpdate {
                conversation_id,
                record,
            }) => publish(
                &events,
                StudioEvent::SceneContinuityUpdated {
                    conversation_id,
                    record,
                },
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "continuity notifications dropped");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

fn publish_added(
    events: &broadcast::Sender<StudioEvent>,
    outcomes: Vec<AddOutcome>,
) -> Vec<WorkspaceItem> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            AddOutcome::Added(item) => {
                publish(events, StudioEvent::WorkspaceItemAdded(item.clone()));
                Some(item)
            }
            AddOutcome::Duplicate(_) => None,
        })
        .collect()
}

fn publish(events: &broadcast::Sender<StudioEvent>, event: StudioEvent) {
    if events.send(event).is_err() {
        tracing::trace!("no studio subscribers");
    }
}
