//! Given steps for scene continuity BDD scenarios.

use super::world::{ContinuityWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use scenecraft::continuity::domain::{ConversationId, SceneId};
use scenecraft::generation::domain::AssetUrl;

#[given(r#"a conversation "{conversation}""#)]
fn a_conversation(world: &mut ContinuityWorld, conversation: String) -> Result<(), eyre::Report> {
    world.conversation = Some(ConversationId::new(conversation)?);
    Ok(())
}

#[given(r#"a scene whose image is "{image}""#)]
fn a_finished_scene(world: &mut ContinuityWorld, image: String) -> Result<(), eyre::Report> {
    let conversation = world.conversation()?.clone();
    let scene_id = SceneId::new();
    run_async(world.tracker.begin_scene(&conversation, scene_id, None))
        .wrap_err("store scene row")?;
    run_async(world.tracker.complete_scene(scene_id, AssetUrl::new(image)?))
        .wrap_err("attach scene image")?;
    Ok(())
}

#[given("a scene still being generated")]
fn a_pending_scene(world: &mut ContinuityWorld) -> Result<(), eyre::Report> {
    let conversation = world.conversation()?.clone();
    run_async(world.tracker.begin_scene(&conversation, SceneId::new(), None))
        .wrap_err("store pending scene row")?;
    Ok(())
}

#[given("the continuity strength is set to {strength:f64}")]
fn strength_is_set(world: &mut ContinuityWorld, strength: f64) -> Result<(), eyre::Report> {
    world.tracker.set_strength(strength)?;
    Ok(())
}

#[given("continuity is disabled")]
fn continuity_disabled(world: &mut ContinuityWorld) -> Result<(), eyre::Report> {
    world.tracker.set_enabled(false)?;
    Ok(())
}
