//! When steps for job status BDD scenarios.

use super::world::{JobStatusWorld, run_async, transition_to};
use rstest_bdd_macros::when;
use scenecraft::generation::domain::{JobFailure, JobTransition};

#[when(r#"the job is moved to "{status}""#)]
fn move_job(world: &mut JobStatusWorld, status: String) -> Result<(), eyre::Report> {
    let job_id = world.job()?.id();
    let transition = transition_to(&status)?;
    let result = run_async(world.service.update_status(job_id, transition));
    if let Ok(ref updated) = result {
        world.job = Some(updated.clone());
    }
    world.last_result = Some(result);
    Ok(())
}

#[when(r#"the job fails with message "{message}""#)]
fn job_fails(world: &mut JobStatusWorld, message: String) -> Result<(), eyre::Report> {
    let job_id = world.job()?.id();
    let failure = JobFailure::from_message(message)?;
    let result = run_async(
        world
            .service
            .update_status(job_id, JobTransition::Failed { failure }),
    );
    if let Ok(ref updated) = result {
        world.job = Some(updated.clone());
    }
    world.last_result = Some(result);
    Ok(())
}
