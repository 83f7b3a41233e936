//! Then steps for job status BDD scenarios.

use super::world::{JobStatusWorld, run_async};
use rstest_bdd_macros::then;
use scenecraft::generation::{
    domain::{GenerationDomainError, JobStatus},
    services::JobLifecycleError,
};

#[then(r#"the job status is "{status}""#)]
fn job_status_is(world: &JobStatusWorld, status: String) -> Result<(), eyre::Report> {
    let expected = JobStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let job_id = world.job()?.id();
    let stored = run_async(world.service.get_job(job_id))?
        .ok_or_else(|| eyre::eyre!("job {job_id} missing from store"))?;

    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            stored.status().as_str()
        ));
    }
    Ok(())
}

#[then("the job has {count:usize} output")]
fn job_has_outputs(world: &JobStatusWorld, count: usize) -> Result<(), eyre::Report> {
    let found = world.job()?.outputs().len();
    if found != count {
        return Err(eyre::eyre!("expected {count} outputs, found {found}"));
    }
    Ok(())
}

#[then(r#"the failure message is "{message}""#)]
fn failure_message_is(world: &JobStatusWorld, message: String) -> Result<(), eyre::Report> {
    let failure = world
        .job()?
        .failure()
        .ok_or_else(|| eyre::eyre!("job carries no failure"))?;
    if failure.raw_message() != message {
        return Err(eyre::eyre!(
            "expected failure {message:?}, found {:?}",
            failure.raw_message()
        ));
    }
    Ok(())
}

#[then("the transition fails with an invalid state transition error")]
fn transition_fails(world: &JobStatusWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;

    if !matches!(
        result,
        Err(JobLifecycleError::Domain(
            GenerationDomainError::InvalidStateTransition { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected InvalidStateTransition error, got {result:?}"
        ));
    }
    Ok(())
}
