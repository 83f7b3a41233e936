//! Error types for model configuration and parameter mapping.

use crate::generation::domain::ModelId;
use std::fmt;
use thiserror::Error;

/// A single rejected parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Canonical parameter name.
    pub field: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl FieldViolation {
    /// Creates a violation for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while turning canonical parameters into provider input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The catalogue has no configuration for the model.
    #[error("no model configuration for {0}")]
    ConfigurationNotFound(ModelId),

    /// One or more parameters break the model's rules.
    #[error("invalid parameters: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),
}

/// Errors raised while loading a model catalogue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// The document is not valid catalogue JSON.
    #[error("malformed model catalogue: {0}")]
    Parse(String),

    /// Two configurations share a model identifier.
    #[error("duplicate model configuration: {0}")]
    DuplicateModel(ModelId),

    /// An aspect-ratio entry has a zero dimension.
    #[error("model {model_id}: aspect ratio {ratio} has a zero dimension")]
    InvalidDimensions {
        /// Offending model.
        model_id: ModelId,
        /// Offending ratio key.
        ratio: String,
    },

    /// A provider field name is blank.
    #[error("model {model_id}: {field} must not be blank")]
    EmptyFieldName {
        /// Offending model.
        model_id: ModelId,
        /// Which descriptor field is blank.
        field: &'static str,
    },

    /// The default image-to-image strength is outside `0.0..=1.0`.
    #[error("model {model_id}: default strength {value} is outside 0.0..=1.0")]
    DefaultStrengthOutOfRange {
        /// Offending model.
        model_id: ModelId,
        /// Configured strength.
        value: f64,
    },

    /// An error-message key is neither a status code nor the default key.
    #[error("model {model_id}: error message key {key} is not a status code")]
    InvalidMessageKey {
        /// Offending model.
        model_id: ModelId,
        /// Offending key.
        key: String,
    },

    /// An error-message template does not compile.
    #[error("model {model_id}: error message template {key} is invalid: {reason}")]
    InvalidTemplate {
        /// Offending model.
        model_id: ModelId,
        /// Status code key of the template.
        key: String,
        /// Template engine diagnostic.
        reason: String,
    },
}
