//! `reqwest` client for prediction-style provider APIs.
//!
//! Models with a pinned version are created through `POST /predictions`;
//! otherwise through `POST /models/{owner}/{name}/predictions`. Status is
//! read with `GET /predictions/{id}`.

use super::wire::{CreatePrediction, decode_prediction, error_message};
use crate::gateway::ports::{
    GenerationProvider, ProviderError, ProviderPrediction, ProviderRequest, ProviderResult,
};
use crate::generation::domain::ProviderHandle;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for an HTTP provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpProviderConfig {
    /// API root without a trailing slash.
    pub base_url: String,
    /// Bearer token.
    pub api_token: String,
    /// Callback URL for completion notifications.
    pub webhook_url: Option<String>,
    /// Per-request timeout, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com/v1".to_owned(),
            api_token: String::new(),
            webhook_url: None,
            timeout_ms: 30_000,
        }
    }
}

/// Provider reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGenerationProvider {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpGenerationProvider {
    /// Creates a provider with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(config: HttpProviderConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a provider reusing an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, config: HttpProviderConfig) -> Self {
        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn read_prediction(response: reqwest::Response) -> ProviderResult<ProviderPrediction> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status_code: status.as_u16(),
                message: error_message(&String::from_utf8_lossy(&body)),
            });
        }
        decode_prediction(&body)
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn submit(&self, request: &ProviderRequest) -> ProviderResult<ProviderHandle> {
        let url = request.version.as_ref().map_or_else(
            || {
                format!(
                    "{}/models/{}/predictions",
                    self.base_url(),
                    request.provider_model
                )
            },
            |_| format!("{}/predictions", self.base_url()),
        );
        let webhook = self.config.webhook_url.as_deref();
        let body = CreatePrediction {
            version: request.version.as_deref(),
            input: request.input.as_map(),
            webhook,
            webhook_events_filter: webhook.map(|_| ["completed"]),
        };

        tracing::debug!(job_id = %request.job_id, model_id = %request.model_id, url = %url, "submitting prediction");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Ok(Self::read_prediction(response).await?.handle)
    }

    async fn check_status(&self, handle: &ProviderHandle) -> ProviderResult<ProviderPrediction> {
        let response = self
            .client
            .get(format!("{}/predictions/{}", self.base_url(), handle.as_str()))
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Self::read_prediction(response).await
    }
}
