//! Session-scoped key-value storage port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for session storage operations.
pub type SessionStorageResult<T> = Result<T, SessionStorageError>;

/// Key-value persistence that lives as long as a user session.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> SessionStorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> SessionStorageResult<()>;

    /// Removes `key`; removing a missing key is not an error.
    async fn remove(&self, key: &str) -> SessionStorageResult<()>;
}

/// Errors returned by session storage implementations.
#[derive(Debug, Clone, Error)]
pub enum SessionStorageError {
    /// The key cannot be represented by this storage.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Stored data could not be decoded.
    #[error("invalid stored data under {key}: {reason}")]
    InvalidData {
        /// Key whose value was rejected.
        key: String,
        /// Decoding failure.
        reason: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionStorageError {
    /// Wraps a decoding failure for `key`.
    pub fn invalid_data(
        key: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidData {
            key: key.into(),
            reason: Arc::new(err),
        }
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
