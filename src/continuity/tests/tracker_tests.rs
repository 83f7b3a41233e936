//! Tests for the scene continuity tracker.

use std::sync::Arc;
use std::time::Duration;

use crate::continuity::{
    adapters::memory::InMemorySceneRepository,
    domain::{
        ContinuityDomainError, ConversationId, PersistedSceneData, PreviousScene,
        SceneContinuityRecord, SceneId, SceneRecord,
    },
    ports::SceneRepository,
    services::{ContinuityConfig, SceneContinuityTracker, TrackerError},
};
use crate::generation::domain::AssetUrl;
use chrono::{DateTime, TimeZone, Utc};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestTracker = SceneContinuityTracker<InMemorySceneRepository, DefaultClock>;

#[fixture]
fn repository() -> Arc<InMemorySceneRepository> {
    Arc::new(InMemorySceneRepository::new())
}

fn tracker_over(repository: &Arc<InMemorySceneRepository>, config: ContinuityConfig) -> TestTracker {
    SceneContinuityTracker::new(Arc::clone(repository), Arc::new(DefaultClock), config)
}

fn conversation(raw: &str) -> ConversationId {
    ConversationId::new(raw).expect("valid conversation")
}

fn url(raw: &str) -> AssetUrl {
    AssetUrl::new(raw).expect("valid url")
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn stored_scene(conversation_id: &ConversationId, image: Option<&str>, minute: u32) -> SceneRecord {
    SceneRecord::from_persisted(PersistedSceneData {
        id: SceneId::new(),
        conversation_id: conversation_id.clone(),
        job_id: None,
        image_url: image.map(url),
        created_at: at(minute),
        updated_at: at(minute),
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_conversation_has_no_previous_scene(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());

    let previous = tracker.get_previous_scene(&conversation("conv-1")).await?;

    ensure!(previous == PreviousScene::Absent);
    ensure!(tracker.tracked_conversations()?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pending_row_is_reported_apart_from_absence(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-2");
    let pending = stored_scene(&conv, None, 5);
    repository.store(&pending).await?;

    let previous = tracker.get_previous_scene(&conv).await?;

    ensure!(
        previous
            == PreviousScene::Pending {
                scene_id: pending.id(),
                last_ready: None,
            }
    );
    ensure!(previous != PreviousScene::Absent);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pending_row_reports_last_complete_scene(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-3");
    let ready = stored_scene(&conv, Some("https://cdn.example/one.png"), 1);
    let pending = stored_scene(&conv, None, 2);
    repository.store(&ready).await?;
    repository.store(&pending).await?;

    let previous = tracker.get_previous_scene(&conv).await?;

    let PreviousScene::Pending {
        scene_id,
        last_ready: Some(record),
    } = previous
    else {
        bail!("expected pending with a ready fallback, got {previous:?}");
    };
    ensure!(scene_id == pending.id());
    ensure!(record.scene_id() == ready.id());
    ensure!(record.image_url() == ready.image_url());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ready_row_is_back_filled(repository: Arc<InMemorySceneRepository>) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-4");
    let ready = stored_scene(&conv, Some("https://cdn.example/one.png"), 1);
    repository.store(&ready).await?;

    let previous = tracker.get_previous_scene(&conv).await?;

    ensure!(previous == PreviousScene::Ready(SceneContinuityRecord::from_scene(&ready)));
    ensure!(tracker.tracked_conversations()? == vec![conv]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn set_last_scene_holds_until_overwritten_or_cleared(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-5");
    let first = SceneId::new();
    let second = SceneId::new();

    tracker.set_last_scene(&conv, first, url("https://cdn.example/a.png"))?;
    let PreviousScene::Ready(record) = tracker.get_previous_scene(&conv).await? else {
        bail!("expected ready pointer");
    };
    ensure!(record.scene_id() == first);
    ensure!(record.image_url().map(AssetUrl::as_str) == Some("https://cdn.example/a.png"));

    tracker.set_last_scene(&conv, second, url("https://cdn.example/b.png"))?;
    let PreviousScene::Ready(replaced) = tracker.get_previous_scene(&conv).await? else {
        bail!("expected ready pointer");
    };
    ensure!(replaced.scene_id() == second);

    ensure!(tracker.clear_last_scene(&conv)?);
    ensure!(tracker.get_previous_scene(&conv).await? == PreviousScene::Absent);
    ensure!(!tracker.clear_last_scene(&conv)?);
    Ok(())
}

#[rstest]
fn eviction_keeps_most_recently_updated(repository: Arc<InMemorySceneRepository>) -> eyre::Result<()> {
    let tracker = tracker_over(
        &repository,
        ContinuityConfig {
            max_tracked_conversations: 3,
            ..ContinuityConfig::default()
        },
    );
    let conversations: Vec<ConversationId> = ["c1", "c2", "c3", "c4", "c5"]
        .into_iter()
        .map(conversation)
        .collect();

    for conv in &conversations {
        tracker.set_last_scene(conv, SceneId::new(), url("https://cdn.example/x.png"))?;
    }
    let c3 = conversation("c3");
    tracker.set_last_scene(&c3, SceneId::new(), url("https://cdn.example/y.png"))?;

    let tracked = tracker.tracked_conversations()?;
    ensure!(tracked.len() == 3);
    ensure!(tracked == vec![conversation("c4"), conversation("c5"), c3]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refresh_replaces_stale_pending_pointer(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-6");
    let scene = tracker.begin_scene(&conv, SceneId::new(), None).await?;
    ensure!(tracker.get_previous_scene(&conv).await?.is_pending());

    let mut finished = scene.clone();
    finished.attach_image(url("https://cdn.example/done.png"), &DefaultClock)?;
    repository.update(&finished).await?;

    let refreshed = tracker.refresh(&conv).await?;
    ensure!(refreshed == PreviousScene::Ready(SceneContinuityRecord::from_scene(&finished)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn complete_scene_updates_store_and_pointer(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-7");
    let scene = tracker.begin_scene(&conv, SceneId::new(), None).await?;

    let record = tracker
        .complete_scene(scene.id(), url("https://cdn.example/scene.png"))
        .await?;

    ensure!(tracker.get_previous_scene(&conv).await? == PreviousScene::Ready(record));
    let stored = repository.find_by_id(scene.id()).await?;
    ensure!(stored.is_some_and(|row| !row.is_pending()));

    let again = tracker
        .complete_scene(scene.id(), url("https://cdn.example/other.png"))
        .await;
    let Err(TrackerError::Domain(ContinuityDomainError::ImageAlreadyAttached(id))) = again else {
        bail!("expected ImageAlreadyAttached, got {again:?}");
    };
    ensure!(id == scene.id());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn complete_scene_rejects_unknown_scene(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let missing = SceneId::new();

    let result = tracker
        .complete_scene(missing, url("https://cdn.example/scene.png"))
        .await;

    let Err(TrackerError::NotFound(id)) = result else {
        bail!("expected NotFound, got {result:?}");
    };
    ensure!(id == missing);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn seed_uses_last_complete_scene_while_pending(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-8");
    let ready = stored_scene(&conv, Some("https://cdn.example/one.png"), 1);
    repository.store(&ready).await?;
    repository.store(&stored_scene(&conv, None, 2)).await?;
    let strength = tracker.set_strength(0.9)?;

    let Some(seed) = tracker.seed_for(&conv).await? else {
        bail!("expected a continuity seed");
    };

    ensure!(seed.scene_id == ready.id());
    ensure!(seed.image_url.as_str() == "https://cdn.example/one.png");
    ensure!(seed.strength == strength);
    ensure!(strength.value().to_bits() == 0.8_f64.to_bits());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_tracker_never_seeds(repository: Arc<InMemorySceneRepository>) -> eyre::Result<()> {
    let tracker = tracker_over(
        &repository,
        ContinuityConfig {
            enabled: false,
            ..ContinuityConfig::default()
        },
    );
    let conv = conversation("conv-9");
    tracker.set_last_scene(&conv, SceneId::new(), url("https://cdn.example/a.png"))?;

    ensure!(tracker.seed_for(&conv).await?.is_none());
    tracker.set_enabled(true)?;
    ensure!(tracker.seed_for(&conv).await?.is_some());
    Ok(())
}

#[rstest]
fn listen_requires_a_change_feed(repository: Arc<InMemorySceneRepository>) {
    let tracker = tracker_over(&repository, ContinuityConfig::default());

    assert!(tracker.listen(conversation("conv-10")).is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listener_applies_images_without_refresh(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let feed = Arc::clone(&repository);
    let tracker = tracker_over(&repository, ContinuityConfig::default()).with_change_feed(feed);
    let conv = conversation("conv-11");
    let scene = tracker.begin_scene(&conv, SceneId::new(), None).await?;
    let mut updates = tracker.subscribe();
    let Some(listener) = tracker.listen(conv.clone()) else {
        bail!("expected a listener");
    };

    let mut finished = scene.clone();
    finished.attach_image(url("https://cdn.example/late.png"), &DefaultClock)?;
    repository.update(&finished).await?;

    let update = tokio::time::timeout(Duration::from_secs(5), updates.recv()).await??;
    ensure!(update.conversation_id == conv);
    ensure!(update.record == Some(SceneContinuityRecord::from_scene(&finished)));
    ensure!(
        tracker.get_previous_scene(&conv).await?
            == PreviousScene::Ready(SceneContinuityRecord::from_scene(&finished))
    );

    listener.shutdown().await;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listener_ignores_older_images(repository: Arc<InMemorySceneRepository>) -> eyre::Result<()> {
    let feed = Arc::clone(&repository);
    let tracker = tracker_over(&repository, ContinuityConfig::default()).with_change_feed(feed);
    let conv = conversation("conv-12");
    let newest = tracker.set_last_scene(&conv, SceneId::new(), url("https://cdn.example/new.png"))?;
    let Some(listener) = tracker.listen(conv.clone()) else {
        bail!("expected a listener");
    };

    repository
        .store(&stored_scene(&conv, Some("https://cdn.example/old.png"), 0))
        .await?;
    listener.shutdown().await;

    ensure!(tracker.get_previous_scene(&conv).await? == PreviousScene::Ready(newest));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn abandoned_scene_falls_back_to_the_last_ready_one(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-13");
    let ready = stored_scene(&conv, Some("https://cdn.example/kept.png"), 0);
    repository.store(&ready).await?;
    let dead = tracker.begin_scene(&conv, SceneId::new(), None).await?;
    ensure!(tracker.get_previous_scene(&conv).await?.is_pending());

    let previous = tracker.abandon_scene(&conv, dead.id()).await?;

    let expected = PreviousScene::Ready(SceneContinuityRecord::from_scene(&ready));
    ensure!(previous == expected);
    ensure!(repository.find_by_id(dead.id()).await?.is_none());
    ensure!(tracker.get_previous_scene(&conv).await? == expected);
    ensure!(tracker.refresh(&conv).await? == expected);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn abandoning_the_only_scene_clears_the_pointer(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-14");
    let dead = tracker.begin_scene(&conv, SceneId::new(), None).await?;
    let mut updates = tracker.subscribe();

    let previous = tracker.abandon_scene(&conv, dead.id()).await?;

    ensure!(previous == PreviousScene::Absent);
    ensure!(tracker.tracked_conversations()?.is_empty());
    let update = updates.try_recv()?;
    ensure!(update.conversation_id == conv);
    ensure!(update.record.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scenes_with_images_cannot_be_abandoned(
    repository: Arc<InMemorySceneRepository>,
) -> eyre::Result<()> {
    let tracker = tracker_over(&repository, ContinuityConfig::default());
    let conv = conversation("conv-15");
    let scene = tracker.begin_scene(&conv, SceneId::new(), None).await?;
    tracker
        .complete_scene(scene.id(), url("https://cdn.example/done.png"))
        .await?;

    let result = tracker.abandon_scene(&conv, scene.id()).await;

    let Err(TrackerError::Domain(ContinuityDomainError::ImageAlreadyAttached(id))) = result else {
        bail!("expected ImageAlreadyAttached, got {result:?}");
    };
    ensure!(id == scene.id());
    ensure!(repository.find_by_id(scene.id()).await?.is_some());
    Ok(())
}
