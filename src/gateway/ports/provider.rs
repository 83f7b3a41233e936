//! Prediction-style provider contract: submit now, finish later.

use crate::gateway::domain::ProviderInput;
use crate::generation::domain::{AssetUrl, JobId, ModelId, ProviderHandle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A request ready to send to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Job the request belongs to.
    pub job_id: JobId,
    /// Caller-facing model identifier.
    pub model_id: ModelId,
    /// Provider model reference.
    pub provider_model: String,
    /// Pinned provider version, if any.
    pub version: Option<String>,
    /// Mapped provider input.
    pub input: ProviderInput,
}

/// Provider-side state of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    /// Accepted but not started.
    Starting,
    /// Running.
    Processing,
    /// Finished with output.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Stopped before finishing.
    Canceled,
}

impl PredictionStatus {
    /// Returns whether the prediction will not change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// Snapshot of a prediction reported by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPrediction {
    /// Provider handle.
    pub handle: ProviderHandle,
    /// Current state.
    pub status: PredictionStatus,
    /// Output assets once succeeded.
    pub outputs: Vec<AssetUrl>,
    /// Provider error text for failed predictions.
    pub error: Option<String>,
}

/// Failures talking to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request never got a response.
    #[error("provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider rejected request ({status_code}): {message}")]
    Rejected {
        /// HTTP-style status code.
        status_code: u16,
        /// Provider message.
        message: String,
    },

    /// The provider answered with something that could not be understood.
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Returns the provider status code, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status_code, .. } => Some(*status_code),
            Self::Transport(_) | Self::InvalidResponse(_) => None,
        }
    }

    /// Returns the provider's own message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Transport(_) | Self::InvalidResponse(_) => self.to_string(),
        }
    }

    /// Returns whether trying again may succeed.
    ///
    /// Transport failures, request timeouts, rate limiting and server
    /// errors are retryable; other rejections are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500..=599)
            }
            Self::InvalidResponse(_) => false,
        }
    }
}

/// External generation provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Submits a request and returns the provider handle.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the provider cannot be reached or
    /// rejects the request.
    async fn submit(&self, request: &ProviderRequest) -> ProviderResult<ProviderHandle>;

    /// Reads the current state of a prediction.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the provider cannot be reached or the
    /// handle is unknown.
    async fn check_status(&self, handle: &ProviderHandle) -> ProviderResult<ProviderPrediction>;
}
