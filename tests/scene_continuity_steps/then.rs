//! Then steps for scene continuity BDD scenarios.

use super::world::ContinuityWorld;
use rstest_bdd_macros::then;
use scenecraft::continuity::domain::{ContinuityStrength, PreviousScene};

#[then("there is no previous scene")]
fn no_previous_scene(world: &ContinuityWorld) -> Result<(), eyre::Report> {
    let previous = world.previous()?;
    if *previous != PreviousScene::Absent {
        return Err(eyre::eyre!("expected no previous scene, got {previous:?}"));
    }
    Ok(())
}

#[then(r#"the previous scene image is "{image}""#)]
fn previous_scene_image(world: &ContinuityWorld, image: String) -> Result<(), eyre::Report> {
    let PreviousScene::Ready(record) = world.previous()? else {
        return Err(eyre::eyre!("expected a finished previous scene"));
    };
    let found = record.image_url().map(|url| url.as_str());
    if found != Some(image.as_str()) {
        return Err(eyre::eyre!("expected image {image:?}, found {found:?}"));
    }
    Ok(())
}

#[then("the previous scene is still being generated")]
fn previous_scene_pending(world: &ContinuityWorld) -> Result<(), eyre::Report> {
    let previous = world.previous()?;
    if !previous.is_pending() {
        return Err(eyre::eyre!("expected a pending scene, got {previous:?}"));
    }
    Ok(())
}

#[then(r#"the last finished image is "{image}""#)]
fn last_finished_image(world: &ContinuityWorld, image: String) -> Result<(), eyre::Report> {
    let found = world
        .previous()?
        .last_ready()
        .and_then(|record| record.image_url())
        .map(|url| url.as_str());
    if found != Some(image.as_str()) {
        return Err(eyre::eyre!("expected image {image:?}, found {found:?}"));
    }
    Ok(())
}

#[then(r#"the seed image is "{image}""#)]
fn seed_image(world: &ContinuityWorld, image: String) -> Result<(), eyre::Report> {
    let seed = world
        .seed()?
        .ok_or_else(|| eyre::eyre!("expected a continuity seed"))?;
    if seed.image_url.as_str() != image {
        return Err(eyre::eyre!(
            "expected seed image {image:?}, found {:?}",
            seed.image_url.as_str()
        ));
    }
    Ok(())
}

#[then("the seed strength is {strength:f64}")]
fn seed_strength(world: &ContinuityWorld, strength: f64) -> Result<(), eyre::Report> {
    let seed = world
        .seed()?
        .ok_or_else(|| eyre::eyre!("expected a continuity seed"))?;
    let expected = ContinuityStrength::new(strength);
    if seed.strength.value().to_bits() != expected.value().to_bits() {
        return Err(eyre::eyre!(
            "expected strength {}, found {}",
            expected.value(),
            seed.strength.value()
        ));
    }
    Ok(())
}

#[then("no seed is offered")]
fn no_seed(world: &ContinuityWorld) -> Result<(), eyre::Report> {
    if let Some(seed) = world.seed()? {
        return Err(eyre::eyre!("expected no seed, got {seed:?}"));
    }
    Ok(())
}
