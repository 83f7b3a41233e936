//! Tests for job submission through the gateway.

use std::sync::Arc;
use std::time::Duration;

use super::catalog;
use crate::gateway::{
    domain::MappingError,
    ports::{GenerationProvider, ProviderError, ProviderPrediction, ProviderRequest, ProviderResult},
    services::{GatewayError, GenerationGateway, RetryPolicy},
};
use crate::generation::{
    adapters::memory::InMemoryJobRepository,
    domain::{GenerationJob, GenerationRequest, JobStatus, OwnerId, ProviderHandle, QualityTier},
    services::{JobLifecycleService, RequestNormalizer},
};
use async_trait::async_trait;
use eyre::{bail, ensure};
use mockable::DefaultClock;
use mockall::{Sequence, mock};
use rstest::{fixture, rstest};

mock! {
    Provider {}

    #[async_trait]
    impl GenerationProvider for Provider {
        async fn submit(&self, request: &ProviderRequest) -> ProviderResult<ProviderHandle>;
        async fn check_status(&self, handle: &ProviderHandle) -> ProviderResult<ProviderPrediction>;
    }
}

type Lifecycle = JobLifecycleService<InMemoryJobRepository, DefaultClock>;

#[fixture]
fn lifecycle() -> Lifecycle {
    JobLifecycleService::new(
        Arc::new(InMemoryJobRepository::new()),
        Arc::new(DefaultClock),
    )
}

fn gateway(
    lifecycle: &Lifecycle,
    provider: MockProvider,
    retry: RetryPolicy,
) -> GenerationGateway<InMemoryJobRepository, DefaultClock, MockProvider> {
    GenerationGateway::new(
        lifecycle.clone(),
        Arc::new(provider),
        Arc::new(catalog()),
        retry,
    )
}

async fn pending_job(lifecycle: &Lifecycle, request: GenerationRequest) -> GenerationJob {
    let params = RequestNormalizer::default()
        .normalize(request)
        .expect("valid request");
    lifecycle
        .create_job(OwnerId::new(), params)
        .await
        .expect("job stored")
}

fn handle(raw: &str) -> ProviderHandle {
    ProviderHandle::new(raw).expect("valid handle")
}

fn rejected(status_code: u16, message: &str) -> ProviderError {
    ProviderError::Rejected {
        status_code,
        message: message.to_owned(),
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn accepted_submission_moves_job_to_processing(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(
        &lifecycle,
        GenerationRequest::image("a sunset").with_quality(QualityTier::Fast),
    )
    .await;
    let mut provider = MockProvider::new();
    provider
        .expect_submit()
        .withf(|request| {
            request.provider_model == "black-forest-labs/flux-dev"
                && request.input.get("num_inference_steps") == Some(&serde_json::json!(12))
                && !request.input.contains("image")
        })
        .times(1)
        .returning(|_| Ok(handle("pred-1")));

    let submitted = gateway(&lifecycle, provider, RetryPolicy::default())
        .submit(job.id())
        .await?;

    ensure!(submitted.status() == JobStatus::Processing);
    ensure!(submitted.provider_handle() == Some(&handle("pred-1")));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn retryable_failures_back_off_then_succeed(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(&lifecycle, GenerationRequest::image("a sunset")).await;
    let mut sequence = Sequence::new();
    let mut provider = MockProvider::new();
    provider
        .expect_submit()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Err(rejected(503, "overloaded")));
    provider
        .expect_submit()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Err(ProviderError::Transport("connection reset".to_owned())));
    provider
        .expect_submit()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(handle("pred-2")));

    let started = tokio::time::Instant::now();
    let submitted = gateway(&lifecycle, provider, RetryPolicy::default())
        .submit(job.id())
        .await?;

    ensure!(submitted.status() == JobStatus::Processing);
    ensure!(started.elapsed() >= Duration::from_millis(3_000));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn client_errors_fail_the_job_without_retry(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(&lifecycle, GenerationRequest::image("a sunset")).await;
    let mut provider = MockProvider::new();
    provider
        .expect_submit()
        .times(1)
        .returning(|_| Err(rejected(422, "width must be a multiple of 16")));

    let failed = gateway(&lifecycle, provider, RetryPolicy::default())
        .submit(job.id())
        .await?;

    ensure!(failed.status() == JobStatus::Failed);
    let Some(failure) = failed.failure() else {
        bail!("failed job carries no failure payload");
    };
    ensure!(failure.status_code() == Some(422));
    ensure!(failure.raw_message() == "width must be a multiple of 16");
    ensure!(
        failure.user_message()
            == "flux-dev could not use these settings: width must be a multiple of 16"
    );
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn exhausted_retries_fail_the_job(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(&lifecycle, GenerationRequest::image("a sunset")).await;
    let mut provider = MockProvider::new();
    provider
        .expect_submit()
        .times(3)
        .returning(|_| Err(rejected(429, "rate limited")));

    let failed = gateway(&lifecycle, provider, RetryPolicy::default())
        .submit(job.id())
        .await?;

    ensure!(failed.status() == JobStatus::Failed);
    ensure!(
        failed.failure().map(|failure| failure.user_message())
            == Some("Too many requests right now. Please try again in a minute.")
    );
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn models_without_templates_show_the_raw_message(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(
        &lifecycle,
        GenerationRequest::image("a sunset").with_model("sdxl-lightning"),
    )
    .await;
    let mut provider = MockProvider::new();
    provider
        .expect_submit()
        .times(1)
        .returning(|_| Err(rejected(400, "invalid scheduler")));

    let failed = gateway(&lifecycle, provider, RetryPolicy::no_retry())
        .submit(job.id())
        .await?;

    ensure!(failed.failure().map(|failure| failure.user_message()) == Some("invalid scheduler"));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn rejection_without_a_message_still_fails_the_job(
    lifecycle: Lifecycle,
) -> eyre::Result<()> {
    let job = pending_job(
        &lifecycle,
        GenerationRequest::image("a sunset").with_model("sdxl-lightning"),
    )
    .await;
    let mut provider = MockProvider::new();
    provider
        .expect_submit()
        .times(1)
        .returning(|_| Err(rejected(400, "")));

    let failed = gateway(&lifecycle, provider, RetryPolicy::no_retry())
        .submit(job.id())
        .await?;

    ensure!(failed.status() == JobStatus::Failed);
    let Some(failure) = failed.failure() else {
        bail!("failed job should carry a failure");
    };
    ensure!(failure.status_code() == Some(400));
    ensure!(failure.user_message() == "The provider rejected the request (status 400).");
    let stored = lifecycle.get_job(job.id()).await?;
    ensure!(stored.map(|stored_job| stored_job.status()) == Some(JobStatus::Failed));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn unknown_model_fails_job_before_submission(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(
        &lifecycle,
        GenerationRequest::image("a sunset").with_model("retired-model"),
    )
    .await;
    let mut provider = MockProvider::new();
    provider.expect_submit().never();

    let result = gateway(&lifecycle, provider, RetryPolicy::default())
        .submit(job.id())
        .await;

    let Err(GatewayError::Mapping(MappingError::ConfigurationNotFound(model))) = result else {
        bail!("expected ConfigurationNotFound, got {result:?}");
    };
    ensure!(model.as_str() == "retired-model");
    let stored = lifecycle.get_job(job.id()).await?;
    ensure!(stored.is_some_and(|current| current.status() == JobStatus::Failed));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn rule_violations_never_reach_processing(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(
        &lifecycle,
        GenerationRequest::image("a sunset").with_parameter("steps", 0),
    )
    .await;
    let mut provider = MockProvider::new();
    provider.expect_submit().never();

    let result = gateway(&lifecycle, provider, RetryPolicy::default())
        .submit(job.id())
        .await;

    ensure!(matches!(
        result,
        Err(GatewayError::Mapping(MappingError::Validation(_)))
    ));
    let stored = lifecycle.get_job(job.id()).await?;
    ensure!(stored.is_some_and(|current| current.status() == JobStatus::Failed));
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn only_pending_jobs_are_submitted(lifecycle: Lifecycle) -> eyre::Result<()> {
    let job = pending_job(&lifecycle, GenerationRequest::image("a sunset")).await;
    let mut provider = MockProvider::new();
    provider
        .expect_submit()
        .times(1)
        .returning(|_| Ok(handle("pred-3")));
    let service = gateway(&lifecycle, provider, RetryPolicy::default());
    service.submit(job.id()).await?;

    let result = service.submit(job.id()).await;

    let Err(GatewayError::NotPending { status, .. }) = result else {
        bail!("expected NotPending, got {result:?}");
    };
    ensure!(status == JobStatus::Processing);
    Ok(())
}

#[rstest]
#[case(1, 1_000)]
#[case(2, 2_000)]
#[case(3, 4_000)]
#[case(4, 8_000)]
#[case(10, 8_000)]
fn backoff_doubles_up_to_the_cap(#[case] retry: u32, #[case] expected_ms: u64) {
    assert_eq!(
        RetryPolicy::default().backoff(retry),
        Duration::from_millis(expected_ms)
    );
}

#[rstest]
#[case(ProviderError::Transport("reset".to_owned()), true)]
#[case(rejected(408, "timeout"), true)]
#[case(rejected(429, "slow down"), true)]
#[case(rejected(502, "bad gateway"), true)]
#[case(rejected(400, "bad input"), false)]
#[case(rejected(401, "unauthorized"), false)]
#[case(ProviderError::InvalidResponse("garbage".to_owned()), false)]
fn retryable_errors_are_classified(#[case] error: ProviderError, #[case] retryable: bool) {
    assert_eq!(error.is_retryable(), retryable);
    assert!(!RetryPolicy::default().should_retry(3, &error));
}
