//! Error types for continuity domain validation.

use super::SceneId;
use thiserror::Error;

/// Errors returned while constructing continuity domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContinuityDomainError {
    /// The conversation identifier is empty after trimming.
    #[error("conversation identifier must not be empty")]
    EmptyConversationId,

    /// A scene image may only be attached once.
    #[error("scene {0} already has an image")]
    ImageAlreadyAttached(SceneId),
}
