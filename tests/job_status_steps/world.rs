//! Shared world state for job status BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use scenecraft::generation::{
    adapters::memory::InMemoryJobRepository,
    domain::{
        AssetUrl, GenerationJob, JobFailure, JobOutput, JobStatus, JobTransition, ProviderHandle,
    },
    services::{JobLifecycleError, JobLifecycleService},
};

/// Service type used by the BDD world.
pub type TestJobService = JobLifecycleService<InMemoryJobRepository, DefaultClock>;

/// Scenario world for job status behaviour tests.
pub struct JobStatusWorld {
    pub service: TestJobService,
    pub job: Option<GenerationJob>,
    pub last_result: Option<Result<GenerationJob, JobLifecycleError>>,
}

impl JobStatusWorld {
    /// Creates a world with no job.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: JobLifecycleService::new(
                Arc::new(InMemoryJobRepository::new()),
                Arc::new(DefaultClock),
            ),
            job: None,
            last_result: None,
        }
    }

    /// Returns the job created by the scenario.
    pub fn job(&self) -> Result<&GenerationJob, eyre::Report> {
        self.job
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing job in scenario world"))
    }
}

impl Default for JobStatusWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> JobStatusWorld {
    JobStatusWorld::default()
}

/// Builds the transition that moves a job into `status`.
pub fn transition_to(status: &str) -> Result<JobTransition, eyre::Report> {
    let target = JobStatus::try_from(status)
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let transition = match target {
        JobStatus::Pending => eyre::bail!("jobs cannot be moved back to pending"),
        JobStatus::Processing => JobTransition::Processing {
            provider_handle: Some(ProviderHandle::new("pred-bdd")?),
        },
        JobStatus::Completed => JobTransition::Completed {
            outputs: vec![JobOutput::new(AssetUrl::new(
                "https://cdn.example/bdd/output-0.webp",
            )?)],
        },
        JobStatus::Failed => JobTransition::Failed {
            failure: JobFailure::from_message("provider error")?,
        },
    };
    Ok(transition)
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
