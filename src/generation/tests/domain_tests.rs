//! Domain tests for the job status machine and typed transitions.

use crate::generation::domain::{
    AssetUrl, GenerationDomainError, GenerationJob, GenerationRequest, JobFailure, JobOutput,
    JobStatus, JobTransition, OwnerId, ProviderHandle,
};
use crate::generation::services::RequestNormalizer;
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

const ALL_STATUSES: [JobStatus; 4] = [
    JobStatus::Pending,
    JobStatus::Processing,
    JobStatus::Completed,
    JobStatus::Failed,
];

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[fixture]
fn pending_job(clock: DefaultClock) -> GenerationJob {
    let params = RequestNormalizer::default()
        .normalize(GenerationRequest::image("a lighthouse at dusk"))
        .expect("valid request");
    GenerationJob::new(OwnerId::new(), params, &clock)
}

fn output(url: &str) -> JobOutput {
    JobOutput::new(AssetUrl::new(url).expect("valid url"))
}

#[rstest]
#[case(JobStatus::Pending, JobStatus::Pending, false)]
#[case(JobStatus::Pending, JobStatus::Processing, true)]
#[case(JobStatus::Pending, JobStatus::Completed, true)]
#[case(JobStatus::Pending, JobStatus::Failed, true)]
#[case(JobStatus::Processing, JobStatus::Pending, false)]
#[case(JobStatus::Processing, JobStatus::Processing, false)]
#[case(JobStatus::Processing, JobStatus::Completed, true)]
#[case(JobStatus::Processing, JobStatus::Failed, true)]
#[case(JobStatus::Completed, JobStatus::Pending, false)]
#[case(JobStatus::Completed, JobStatus::Processing, false)]
#[case(JobStatus::Completed, JobStatus::Completed, false)]
#[case(JobStatus::Completed, JobStatus::Failed, false)]
#[case(JobStatus::Failed, JobStatus::Pending, false)]
#[case(JobStatus::Failed, JobStatus::Processing, false)]
#[case(JobStatus::Failed, JobStatus::Completed, false)]
#[case(JobStatus::Failed, JobStatus::Failed, false)]
fn can_transition_to_returns_expected(
    #[case] from: JobStatus,
    #[case] to: JobStatus,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
fn terminal_statuses_accept_nothing() {
    for from in ALL_STATUSES.into_iter().filter(|status| status.is_terminal()) {
        for to in ALL_STATUSES {
            assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
        }
    }
}

#[rstest]
#[case("pending", JobStatus::Pending)]
#[case("processing", JobStatus::Processing)]
#[case("completed", JobStatus::Completed)]
#[case("failed", JobStatus::Failed)]
fn status_parses_from_storage_form(#[case] raw: &str, #[case] expected: JobStatus) {
    assert_eq!(JobStatus::try_from(raw), Ok(expected));
    assert_eq!(expected.as_str(), raw);
}

#[rstest]
fn status_rejects_unknown_value() {
    assert!(JobStatus::try_from("queued").is_err());
}

#[rstest]
fn new_job_starts_pending(pending_job: GenerationJob) {
    assert_eq!(pending_job.status(), JobStatus::Pending);
    assert_eq!(pending_job.created_at(), pending_job.updated_at());
    assert!(pending_job.started_at().is_none());
    assert!(pending_job.outputs().is_empty());
}

#[rstest]
fn processing_records_handle_and_start_time(
    mut pending_job: GenerationJob,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let handle = ProviderHandle::new("pred-123")?;
    pending_job.apply(
        JobTransition::Processing {
            provider_handle: Some(handle.clone()),
        },
        &clock,
    )?;

    ensure!(pending_job.status() == JobStatus::Processing);
    ensure!(pending_job.provider_handle() == Some(&handle));
    ensure!(pending_job.started_at().is_some());
    ensure!(pending_job.completed_at().is_none());
    Ok(())
}

#[rstest]
fn marking_processing_job_pending_is_rejected(
    mut pending_job: GenerationJob,
    clock: DefaultClock,
) -> eyre::Result<()> {
    pending_job.apply(
        JobTransition::Processing {
            provider_handle: None,
        },
        &clock,
    )?;

    let result = pending_job.check_transition(JobStatus::Pending);

    let Err(GenerationDomainError::InvalidStateTransition { from, to, .. }) = result else {
        bail!("expected InvalidStateTransition, got {result:?}");
    };
    ensure!(from == JobStatus::Processing);
    ensure!(to == JobStatus::Pending);
    ensure!(pending_job.status() == JobStatus::Processing);
    Ok(())
}

#[rstest]
fn completion_requires_outputs(mut pending_job: GenerationJob, clock: DefaultClock) {
    let result = pending_job.apply(JobTransition::Completed { outputs: vec![] }, &clock);

    assert_eq!(
        result,
        Err(GenerationDomainError::CompletedWithoutOutput(pending_job.id()))
    );
    assert_eq!(pending_job.status(), JobStatus::Pending);
}

#[rstest]
fn completed_job_rejects_late_failure(
    mut pending_job: GenerationJob,
    clock: DefaultClock,
) -> eyre::Result<()> {
    pending_job.apply(
        JobTransition::Completed {
            outputs: vec![output("https://cdn.example/out.png")],
        },
        &clock,
    )?;
    let before = pending_job.clone();

    let result = pending_job.apply(
        JobTransition::Failed {
            failure: JobFailure::from_message("late webhook")?,
        },
        &clock,
    );

    ensure!(result.is_err());
    ensure!(pending_job == before);
    ensure!(pending_job.completed_at().is_some());
    Ok(())
}

#[rstest]
fn pending_job_may_fail_directly(
    mut pending_job: GenerationJob,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let failure = JobFailure::new(Some(422), "invalid input: width", "The size is not supported")?;
    pending_job.apply(JobTransition::Failed { failure }, &clock)?;

    ensure!(pending_job.status() == JobStatus::Failed);
    let Some(recorded) = pending_job.failure() else {
        bail!("failed job should carry its failure");
    };
    ensure!(recorded.status_code() == Some(422));
    ensure!(recorded.user_message() == "The size is not supported");
    ensure!(recorded.raw_message() == "invalid input: width");
    Ok(())
}

#[rstest]
#[case("")]
#[case("   ")]
fn failure_requires_user_message(#[case] message: &str) {
    assert_eq!(
        JobFailure::new(Some(500), "boom", message),
        Err(GenerationDomainError::EmptyFailureMessage)
    );
}

#[rstest]
fn deserialized_failure_requires_user_message() {
    let decoded = serde_json::from_value::<JobFailure>(serde_json::json!({
        "status_code": null,
        "raw_message": "boom",
        "user_message": "",
    }));

    assert!(decoded.is_err());
}

#[rstest]
fn job_round_trips_through_serde(pending_job: GenerationJob) -> eyre::Result<()> {
    let encoded = serde_json::to_value(&pending_job)?;
    let decoded: GenerationJob = serde_json::from_value(encoded)?;
    ensure!(decoded == pending_job);
    Ok(())
}
