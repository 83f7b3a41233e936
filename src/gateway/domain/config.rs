//! Per-model configuration: defaults, field mapping, rules and presets.

use super::{CatalogError, FieldViolation};
use crate::generation::domain::{ContentMode, JobKind, ModelId, QualityTier};
use indexmap::IndexMap;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the error-message template used when no status code matches.
pub const DEFAULT_ERROR_MESSAGE_KEY: &str = "default";

/// JSON value type accepted by a [`ParameterRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// JSON string.
    String,
    /// Whole JSON number.
    Integer,
    /// Any JSON number.
    Number,
    /// JSON boolean.
    Boolean,
}

impl ValueType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Validation rule for one canonical parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterRule {
    /// The parameter must be present.
    pub required: bool,
    /// Accepted JSON type.
    #[serde(rename = "type")]
    pub value_type: Option<ValueType>,
    /// Inclusive lower bound for numbers.
    pub min: Option<f64>,
    /// Inclusive upper bound for numbers.
    pub max: Option<f64>,
    /// Accepted values; empty accepts anything.
    pub allowed: Vec<Value>,
    /// Maximum length in characters for strings.
    pub max_length: Option<usize>,
}

impl ParameterRule {
    /// Checks a value, appending any violations to `violations`.
    pub fn check(&self, field: &str, value: Option<&Value>, violations: &mut Vec<FieldViolation>) {
        let Some(present) = value.filter(|candidate| !candidate.is_null()) else {
            if self.required {
                violations.push(FieldViolation::new(field, "is required"));
            }
            return;
        };

        if let Some(expected) = self.value_type.filter(|kind| !kind.matches(present)) {
            violations.push(FieldViolation::new(
                field,
                format!("must be of type {}", expected.as_str()),
            ));
            return;
        }

        if let Some(number) = present.as_f64() {
            if let Some(min) = self.min.filter(|min| number < *min) {
                violations.push(FieldViolation::new(field, format!("must be at least {min}")));
            }
            if let Some(max) = self.max.filter(|max| number > *max) {
                violations.push(FieldViolation::new(field, format!("must be at most {max}")));
            }
        }

        if let (Some(text), Some(limit)) = (present.as_str(), self.max_length) {
            if text.chars().count() > limit {
                violations.push(FieldViolation::new(
                    field,
                    format!("must be at most {limit} characters"),
                ));
            }
        }

        if !self.allowed.is_empty() && !self.allowed.contains(present) {
            let options = self
                .allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            violations.push(FieldViolation::new(
                field,
                format!("must be one of {options}"),
            ));
        }
    }
}

/// Image-to-image support descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageToImageSupport {
    /// Provider field receiving the reference image URL.
    pub image_field: String,
    /// Provider field receiving the strength.
    pub strength_field: String,
    /// Strength used when the request carries none.
    #[serde(default)]
    pub default_strength: Option<f64>,
}

/// Output size resolved from an aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Provider field toggled by content mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyToggle {
    /// Provider field name.
    pub field: String,
    /// Value sent for safe-for-work requests.
    pub sfw: Value,
    /// Value sent for unrestricted requests.
    pub nsfw: Value,
}

impl SafetyToggle {
    /// Returns the value for a content mode.
    #[must_use]
    pub const fn value_for(&self, mode: ContentMode) -> &Value {
        match mode {
            ContentMode::Sfw => &self.sfw,
            ContentMode::Nsfw => &self.nsfw,
        }
    }
}

/// Everything needed to build a provider request for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    /// Model identifier used by callers.
    pub model_id: ModelId,
    /// Provider model reference, such as `owner/name`.
    pub provider: String,
    /// Family used for negative-prompt lookups.
    pub model_family: String,
    /// Optional pinned provider version.
    #[serde(default)]
    pub version: Option<String>,
    /// Output modality.
    pub kind: JobKind,
    /// Baseline provider input.
    #[serde(default)]
    pub input_defaults: Map<String, Value>,
    /// Canonical name to provider field; unmapped names pass through.
    #[serde(default)]
    pub parameter_mapping: IndexMap<String, String>,
    /// Rules keyed by canonical name.
    #[serde(default)]
    pub validation: IndexMap<String, ParameterRule>,
    /// Provider fields overlaid per non-baseline quality tier.
    #[serde(default)]
    pub quality_presets: IndexMap<QualityTier, Map<String, Value>>,
    /// Image-to-image support, when the model has it.
    #[serde(default)]
    pub image_to_image: Option<ImageToImageSupport>,
    /// Aspect-ratio hints resolved to explicit dimensions.
    #[serde(default)]
    pub aspect_ratios: IndexMap<String, Dimensions>,
    /// Content-mode safety toggle.
    #[serde(default)]
    pub safety: Option<SafetyToggle>,
    /// User-facing error templates keyed by status code or
    /// [`DEFAULT_ERROR_MESSAGE_KEY`].
    #[serde(default)]
    pub error_messages: IndexMap<String, String>,
}

impl ModelConfiguration {
    /// Returns the provider field for a canonical parameter name.
    #[must_use]
    pub fn provider_field<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.parameter_mapping
            .get(canonical)
            .map_or(canonical, String::as_str)
    }

    /// Renders the user-facing message for a provider failure.
    ///
    /// Returns `None` when no template applies or rendering fails, in which
    /// case callers show the raw message.
    #[must_use]
    pub fn user_message(&self, status_code: Option<u16>, raw_message: &str) -> Option<String> {
        let template = status_code
            .and_then(|code| self.error_messages.get(&code.to_string()))
            .or_else(|| self.error_messages.get(DEFAULT_ERROR_MESSAGE_KEY))?;
        let environment = Environment::new();
        match environment.render_str(
            template,
            context! {
                status_code => status_code,
                message => raw_message,
                model => self.model_id.as_str(),
            },
        ) {
            Ok(rendered) => Some(rendered.trim().to_owned()).filter(|text| !text.is_empty()),
            Err(err) => {
                tracing::warn!(model_id = %self.model_id, error = %err, "error template failed to render");
                None
            }
        }
    }

    /// Checks the configuration's internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let model_id = &self.model_id;
        if self.provider.trim().is_empty() {
            return Err(CatalogError::EmptyFieldName {
                model_id: model_id.clone(),
                field: "provider",
            });
        }
        if let Some(support) = &self.image_to_image {
            if support.image_field.trim().is_empty() {
                return Err(CatalogError::EmptyFieldName {
                    model_id: model_id.clone(),
                    field: "image_to_image.image_field",
                });
            }
            if support.strength_field.trim().is_empty() {
                return Err(CatalogError::EmptyFieldName {
                    model_id: model_id.clone(),
                    field: "image_to_image.strength_field",
                });
            }
            if let Some(value) = support
                .default_strength
                .filter(|strength| !(0.0..=1.0).contains(strength))
            {
                return Err(CatalogError::DefaultStrengthOutOfRange {
                    model_id: model_id.clone(),
                    value,
                });
            }
        }
        if let Some((ratio, _)) = self
            .aspect_ratios
            .iter()
            .find(|(_, dims)| dims.width == 0 || dims.height == 0)
        {
            return Err(CatalogError::InvalidDimensions {
                model_id: model_id.clone(),
                ratio: ratio.clone(),
            });
        }
        if self
            .safety
            .as_ref()
            .is_some_and(|toggle| toggle.field.trim().is_empty())
        {
            return Err(CatalogError::EmptyFieldName {
                model_id: model_id.clone(),
                field: "safety.field",
            });
        }
        self.validate_error_messages()
    }

    fn validate_error_messages(&self) -> Result<(), CatalogError> {
        let environment = Environment::new();
        for (key, template) in &self.error_messages {
            if key != DEFAULT_ERROR_MESSAGE_KEY && key.parse::<u16>().is_err() {
                return Err(CatalogError::InvalidMessageKey {
                    model_id: self.model_id.clone(),
                    key: key.clone(),
                });
            }
            if let Err(err) = environment.template_from_str(template) {
                return Err(CatalogError::InvalidTemplate {
                    model_id: self.model_id.clone(),
                    key: key.clone(),
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }
}
