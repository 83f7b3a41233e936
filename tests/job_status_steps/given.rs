//! Given steps for job status BDD scenarios.

use super::world::{JobStatusWorld, run_async, transition_to};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use scenecraft::generation::{
    domain::{GenerationRequest, OwnerId},
    services::RequestNormalizer,
};

#[given(r#"a pending image job with prompt "{prompt}""#)]
fn pending_image_job(world: &mut JobStatusWorld, prompt: String) -> Result<(), eyre::Report> {
    let params = RequestNormalizer::default()
        .normalize(GenerationRequest::image(prompt))
        .wrap_err("normalize scenario request")?;
    let created = run_async(world.service.create_job(OwnerId::new(), params))
        .wrap_err("create job for scenario")?;
    world.job = Some(created);
    Ok(())
}

#[given(r#"the job has been moved to "{status}""#)]
fn job_has_been_moved(world: &mut JobStatusWorld, status: String) -> Result<(), eyre::Report> {
    let job_id = world.job()?.id();
    let transition = transition_to(&status)?;
    let updated = run_async(world.service.update_status(job_id, transition))
        .wrap_err("move job in scenario setup")?;
    world.job = Some(updated);
    Ok(())
}
