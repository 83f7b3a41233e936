//! Behaviour tests for scene continuity tracking.

#[path = "scene_continuity_steps/mod.rs"]
mod scene_continuity_steps_defs;

use rstest_bdd_macros::scenario;
use scene_continuity_steps_defs::world::{ContinuityWorld, world};

#[scenario(
    path = "tests/features/scene_continuity.feature",
    name = "A new conversation has no previous scene"
)]
#[tokio::test(flavor = "multi_thread")]
async fn new_conversation_has_no_previous_scene(world: ContinuityWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/scene_continuity.feature",
    name = "A finished scene becomes the previous scene"
)]
#[tokio::test(flavor = "multi_thread")]
async fn finished_scene_becomes_previous(world: ContinuityWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/scene_continuity.feature",
    name = "A scene in progress still offers the last finished image"
)]
#[tokio::test(flavor = "multi_thread")]
async fn pending_scene_offers_last_finished_image(world: ContinuityWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/scene_continuity.feature",
    name = "Seeding uses the clamped continuity strength"
)]
#[tokio::test(flavor = "multi_thread")]
async fn seeding_uses_clamped_strength(world: ContinuityWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/scene_continuity.feature",
    name = "Disabled continuity does not seed"
)]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_continuity_does_not_seed(world: ContinuityWorld) {
    let _ = world;
}
