//! When steps for scene continuity BDD scenarios.

use super::world::{ContinuityWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the previous scene is requested")]
fn previous_scene_requested(world: &mut ContinuityWorld) -> Result<(), eyre::Report> {
    let conversation = world.conversation()?.clone();
    let previous = run_async(world.tracker.get_previous_scene(&conversation))
        .wrap_err("look up previous scene")?;
    world.previous = Some(previous);
    Ok(())
}

#[when("the next scene is seeded")]
fn next_scene_seeded(world: &mut ContinuityWorld) -> Result<(), eyre::Report> {
    let conversation = world.conversation()?.clone();
    let seed =
        run_async(world.tracker.seed_for(&conversation)).wrap_err("compute continuity seed")?;
    world.seed = Some(seed);
    Ok(())
}
