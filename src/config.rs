//! Runtime configuration for a studio session.
//!
//! Every field has a default, so an empty JSON object yields the stock
//! behaviour: polls every two seconds for fifteen attempts, a 300 ms
//! workspace debounce and continuity strengths clamped to `0.2..=0.8`.

use crate::continuity::services::ContinuityConfig;
use crate::gateway::services::RetryPolicy;
use crate::generation::domain::DefaultModels;
use crate::generation::services::WatchConfig;
use crate::workspace::services::WorkspaceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings shared by every context of a studio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Job watch cadence and budget.
    pub watch: WatchConfig,
    /// Workspace persistence settings.
    pub workspace: WorkspaceConfig,
    /// Scene continuity cache settings.
    pub continuity: ContinuityConfig,
    /// Provider submission retries.
    pub retry: RetryPolicy,
    /// Models used when a request names none.
    pub default_models: DefaultModels,
}

/// Errors raised while loading a [`StudioConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The document is not valid configuration JSON.
    #[error("invalid studio configuration: {0}")]
    Parse(String),
    /// A setting that must be positive is zero.
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// Dotted path of the offending setting.
        field: &'static str,
    },
}

impl StudioConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents, including
    /// blank default model identifiers, and [`ConfigError::NotPositive`]
    /// when [`StudioConfig::validate`] fails.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that budgets, intervals and capacities are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] naming the first zero setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("watch.interval_ms", self.watch.interval_ms > 0),
            ("watch.max_attempts", self.watch.max_attempts > 0),
            (
                "continuity.max_tracked_conversations",
                self.continuity.max_tracked_conversations > 0,
            ),
            ("retry.max_attempts", self.retry.max_attempts > 0),
            ("retry.multiplier", self.retry.multiplier > 0),
        ];
        checks
            .into_iter()
            .find(|(_, positive)| !positive)
            .map_or(Ok(()), |(field, _)| Err(ConfigError::NotPositive { field }))
    }
}
