//! Provider completion callbacks and status reconciliation.

use super::{GatewayError, GatewayResult};
use crate::gateway::domain::ModelCatalog;
use crate::gateway::ports::{GenerationProvider, PredictionStatus, ProviderPrediction};
use crate::generation::domain::{GenerationJob, JobFailure, JobId, JobOutput, JobTransition};
use crate::generation::ports::JobRepository;
use crate::generation::services::JobLifecycleService;
use mockable::Clock;
use std::sync::Arc;

const CANCELED_MESSAGE: &str = "The generation was canceled.";
const EMPTY_OUTPUT_MESSAGE: &str = "The provider finished without producing any output.";
const UNKNOWN_FAILURE_MESSAGE: &str = "The provider reported a failure.";

/// What a callback or reconciliation did to the job.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// The job moved to a new status.
    Applied(GenerationJob),
    /// The job was already terminal; nothing changed.
    AlreadySettled(GenerationJob),
    /// The prediction is still running.
    InProgress(GenerationJob),
}

impl CallbackOutcome {
    /// Returns the job after handling.
    #[must_use]
    pub const fn job(&self) -> &GenerationJob {
        match self {
            Self::Applied(job) | Self::AlreadySettled(job) | Self::InProgress(job) => job,
        }
    }
}

/// Applies provider-reported prediction states to jobs.
pub struct ProviderCallbackService<R, C, P>
where
    R: JobRepository,
    C: Clock + Send + Sync,
    P: GenerationProvider,
{
    lifecycle: JobLifecycleService<R, C>,
    provider: Arc<P>,
    catalog: Arc<ModelCatalog>,
}

impl<R, C, P> Clone for ProviderCallbackService<R, C, P>
where
    R: JobRepository,
    C: Clock + Send + Sync,
    P: GenerationProvider,
{
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            provider: Arc::clone(&self.provider),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<R, C, P> ProviderCallbackService<R, C, P>
where
    R: JobRepository,
    C: Clock + Send + Sync,
    P: GenerationProvider,
{
    /// Creates a callback service.
    #[must_use]
    pub const fn new(
        lifecycle: JobLifecycleService<R, C>,
        provider: Arc<P>,
        catalog: Arc<ModelCatalog>,
    ) -> Self {
        Self {
            lifecycle,
            provider,
            catalog,
        }
    }

    /// Applies a prediction pushed by the provider.
    ///
    /// Callbacks for jobs that are already terminal are acknowledged
    /// without changes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownHandle`] when no job carries the
    /// handle and [`GatewayError::Lifecycle`] when the job store fails.
    pub async fn handle(&self, prediction: ProviderPrediction) -> GatewayResult<CallbackOutcome> {
        let job = self
            .lifecycle
            .find_by_provider_handle(&prediction.handle)
            .await?
            .ok_or_else(|| GatewayError::UnknownHandle(prediction.handle.clone()))?;
        self.apply(job, prediction).await
    }

    /// Asks the provider for the job's state and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for unknown jobs,
    /// [`GatewayError::MissingProviderHandle`] for jobs never accepted by a
    /// provider and [`GatewayError::Provider`] when the status check fails.
    pub async fn reconcile(&self, job_id: JobId) -> GatewayResult<CallbackOutcome> {
        let job = self
            .lifecycle
            .get_job(job_id)
            .await?
            .ok_or(GatewayError::NotFound(job_id))?;
        if job.status().is_terminal() {
            return Ok(CallbackOutcome::AlreadySettled(job));
        }
        let handle = job
            .provider_handle()
            .cloned()
            .ok_or(GatewayError::MissingProviderHandle(job_id))?;
        let prediction = self.provider.check_status(&handle).await?;
        self.apply(job, prediction).await
    }

    async fn apply(
        &self,
        job: GenerationJob,
        prediction: ProviderPrediction,
    ) -> GatewayResult<CallbackOutcome> {
        if job.status().is_terminal() {
            tracing::debug!(job_id = %job.id(), status = %job.status(), "ignoring callback for settled job");
            return Ok(CallbackOutcome::AlreadySettled(job));
        }

        let job_id = job.id();
        let transition = match prediction.status {
            PredictionStatus::Starting | PredictionStatus::Processing => {
                if job.provider_handle().is_some() {
                    return Ok(CallbackOutcome::InProgress(job));
                }
                JobTransition::Processing {
                    provider_handle: Some(prediction.handle),
                }
            }
            PredictionStatus::Succeeded if prediction.outputs.is_empty() => JobTransition::Failed {
                failure: self.failure(&job, EMPTY_OUTPUT_MESSAGE)?,
            },
            PredictionStatus::Succeeded => JobTransition::Completed {
                outputs: prediction.outputs.into_iter().map(JobOutput::new).collect(),
            },
            PredictionStatus::Failed => JobTransition::Failed {
                failure: self.failure(
                    &job,
                    prediction.error.as_deref().unwrap_or(UNKNOWN_FAILURE_MESSAGE),
                )?,
            },
            PredictionStatus::Canceled => JobTransition::Failed {
                failure: self.failure(&job, CANCELED_MESSAGE)?,
            },
        };

        match self.lifecycle.update_status(job_id, transition).await {
            Ok(updated) if updated.status().is_terminal() => Ok(CallbackOutcome::Applied(updated)),
            Ok(updated) => Ok(CallbackOutcome::InProgress(updated)),
            Err(err) => {
                let gateway_err = GatewayError::from(err);
                if !gateway_err.is_lost_race() {
                    return Err(gateway_err);
                }
                let current = self
                    .lifecycle
                    .get_job(job_id)
                    .await?
                    .ok_or(GatewayError::NotFound(job_id))?;
                Ok(CallbackOutcome::AlreadySettled(current))
            }
        }
    }

    fn failure(&self, job: &GenerationJob, raw: &str) -> GatewayResult<JobFailure> {
        let detail = if raw.trim().is_empty() {
            UNKNOWN_FAILURE_MESSAGE
        } else {
            raw
        };
        let user = self
            .catalog
            .get(job.model_id())
            .ok()
            .and_then(|config| config.user_message(None, detail))
            .unwrap_or_else(|| detail.to_owned());
        Ok(JobFailure::new(None, detail, user)?)
    }
}
