//! Submission of pending jobs to the external provider.

use super::{GatewayError, GatewayResult, RetryPolicy};
use crate::gateway::domain::{
    MappingError, ModelCatalog, ModelConfiguration, build_provider_input,
};
use crate::gateway::ports::{GenerationProvider, ProviderError, ProviderRequest};
use crate::generation::domain::{
    GenerationJob, JobFailure, JobId, JobStatus, JobTransition, ProviderHandle,
};
use crate::generation::ports::JobRepository;
use crate::generation::services::JobLifecycleService;
use mockable::Clock;
use std::sync::Arc;

const UNDESCRIBED_REJECTION_MESSAGE: &str = "The provider rejected the request.";

/// Maps pending jobs onto provider requests and submits them.
pub struct GenerationGateway<R, C, P>
where
    R: JobRepository,
    C: Clock + Send + Sync,
    P: GenerationProvider,
{
    lifecycle: JobLifecycleService<R, C>,
    provider: Arc<P>,
    catalog: Arc<ModelCatalog>,
    retry: RetryPolicy,
}

impl<R, C, P> Clone for GenerationGateway<R, C, P>
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
            retry: self.retry,
        }
    }
}

impl<R, C, P> GenerationGateway<R, C, P>
where
    R: JobRepository,
    C: Clock + Send + Sync,
    P: GenerationProvider,
{
    /// Creates a gateway.
    #[must_use]
    pub const fn new(
        lifecycle: JobLifecycleService<R, C>,
        provider: Arc<P>,
        catalog: Arc<ModelCatalog>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            lifecycle,
            provider,
            catalog,
            retry,
        }
    }

    /// Returns the model catalogue.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Submits a pending job.
    ///
    /// On success the job moves to `processing` with the provider handle
    /// attached. Provider failures that outlast the retry policy mark the
    /// job `failed` and are reported through the returned job, not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Mapping`] when the model is unknown or the
    /// parameters break its rules; the job is marked `failed` first.
    /// Returns [`GatewayError::NotFound`] or [`GatewayError::NotPending`]
    /// when the job cannot be submitted, and [`GatewayError::Lifecycle`]
    /// when the job store fails.
    pub async fn submit(&self, job_id: JobId) -> GatewayResult<GenerationJob> {
        let job = self
            .lifecycle
            .get_job(job_id)
            .await?
            .ok_or(GatewayError::NotFound(job_id))?;
        if job.status() != JobStatus::Pending {
            return Err(GatewayError::NotPending {
                job_id,
                status: job.status(),
            });
        }

        let prepared = self.catalog.get(job.model_id()).and_then(|config| {
            build_provider_input(config, job.params(), self.catalog.negative_prompts())
                .map(|input| (config, input))
        });
        let (config, input) = match prepared {
            Ok(prepared_input) => prepared_input,
            Err(err) => return Err(self.reject(job_id, err).await),
        };

        let request = ProviderRequest {
            job_id,
            model_id: job.model_id().clone(),
            provider_model: config.provider.clone(),
            version: config.version.clone(),
            input,
        };

        match self.submit_with_retry(&request).await {
            Ok(handle) => self.accept(job_id, handle).await,
            Err(err) => self.fail(job_id, config, &err).await,
        }
    }

    async fn submit_with_retry(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderHandle, ProviderError> {
        let mut attempt: u32 = 1;
        loop {
            match self.provider.submit(request).await {
                Ok(handle) => return Ok(handle),
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        job_id = %request.job_id,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "provider submission failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn accept(&self, job_id: JobId, handle: ProviderHandle) -> GatewayResult<GenerationJob> {
        let transition = JobTransition::Processing {
            provider_handle: Some(handle),
        };
        match self.lifecycle.update_status(job_id, transition).await {
            Ok(job) => Ok(job),
            Err(err) => {
                let gateway_err = GatewayError::from(err);
                if !gateway_err.is_lost_race() {
                    return Err(gateway_err);
                }
                tracing::info!(job_id = %job_id, "job settled before submission was acknowledged");
                self.lifecycle
                    .get_job(job_id)
                    .await?
                    .ok_or(GatewayError::NotFound(job_id))
            }
        }
    }

    async fn fail(
        &self,
        job_id: JobId,
        config: &ModelConfiguration,
        err: &ProviderError,
    ) -> GatewayResult<GenerationJob> {
        let raw = err.message();
        let status_code = err.status_code();
        let user = config
            .user_message(status_code, &raw)
            .unwrap_or_else(|| rejection_message(&raw, status_code));
        tracing::warn!(
            job_id = %job_id,
            status_code = ?status_code,
            error = %err,
            "provider rejected submission"
        );
        let failure = JobFailure::new(status_code, raw, user)?;
        Ok(self
            .lifecycle
            .update_status(job_id, JobTransition::Failed { failure })
            .await?)
    }

    async fn reject(&self, job_id: JobId, err: MappingError) -> GatewayError {
        tracing::warn!(job_id = %job_id, error = %err, "job rejected before submission");
        let failure = match JobFailure::from_message(rejection_message(&err.to_string(), None)) {
            Ok(failure) => failure,
            Err(domain_err) => return domain_err.into(),
        };
        if let Err(update_err) = self
            .lifecycle
            .update_status(job_id, JobTransition::Failed { failure })
            .await
        {
            tracing::warn!(job_id = %job_id, error = %update_err, "could not mark rejected job failed");
        }
        err.into()
    }
}

/// Returns `raw` when it says something, otherwise a generic message
/// naming the status code.
fn rejection_message(raw: &str, status_code: Option<u16>) -> String {
    if !raw.trim().is_empty() {
        return raw.to_owned();
    }
    status_code.map_or_else(
        || UNDESCRIBED_REJECTION_MESSAGE.to_owned(),
        |code| format!("The provider rejected the request (status {code})."),
    )
}
