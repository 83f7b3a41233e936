//! Pure mapping from canonical parameters to a provider input object.
//!
//! Sources are layered with later layers winning: model input defaults,
//! the quality preset, derived fields (reference image, aspect-ratio
//! dimensions, safety toggle, default negative prompt), then values the
//! caller supplied explicitly.

use super::{FieldViolation, MappingError, ModelConfiguration, NegativePromptTable};
use crate::generation::domain::{
    ASPECT_RATIO_FIELD, CanonicalParams, HEIGHT_FIELD, NEGATIVE_PROMPT_FIELD, WIDTH_FIELD,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical name under which a reference strength is validated.
const STRENGTH_FIELD: &str = "strength";

/// Flat provider input, keyed by provider field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderInput(Map<String, Value>);

impl ProviderInput {
    /// Wraps an existing JSON object.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the value of a provider field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns whether a provider field is set.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the owned JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Validates canonical parameters against a model and builds its input.
///
/// A reference image is dropped silently when the model has no
/// image-to-image support. Without a reference image the model's
/// image-to-image fields are never sent, even if defaults or presets name
/// them.
///
/// # Errors
///
/// Returns [`MappingError::Validation`] with every rejected field when the
/// parameters break the model's rules.
pub fn build_provider_input(
    config: &ModelConfiguration,
    params: &CanonicalParams,
    negative_prompts: &NegativePromptTable,
) -> Result<ProviderInput, MappingError> {
    let explicit = params.explicit_values();
    let violations = validate(config, params, &explicit);
    if !violations.is_empty() {
        return Err(MappingError::Validation(violations));
    }

    let mut input = config.input_defaults.clone();
    if !params.quality.is_baseline() {
        if let Some(preset) = config.quality_presets.get(&params.quality) {
            input.extend(preset.clone());
        }
    }
    input.extend(derived_fields(config, params, negative_prompts));
    input.extend(
        explicit
            .into_iter()
            .map(|(name, value)| (config.provider_field(&name).to_owned(), value)),
    );

    let reference_sent = params.reference.is_some();
    if let Some(support) = config.image_to_image.as_ref().filter(|_| !reference_sent) {
        input.remove(&support.image_field);
        input.remove(&support.strength_field);
    }

    Ok(ProviderInput(input))
}

fn validate(
    config: &ModelConfiguration,
    params: &CanonicalParams,
    explicit: &Map<String, Value>,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    if params.kind != config.kind {
        violations.push(FieldViolation::new(
            "kind",
            format!("model {} generates {} output", config.model_id, config.kind),
        ));
    }
    let strength = params
        .reference
        .as_ref()
        .and_then(|reference| reference.strength)
        .map(|value| Value::from(value.value()));
    for (field, rule) in &config.validation {
        let value = if field == STRENGTH_FIELD {
            strength.as_ref()
        } else {
            explicit.get(field)
        };
        rule.check(field, value, &mut violations);
    }
    violations
}

fn derived_fields(
    config: &ModelConfiguration,
    params: &CanonicalParams,
    negative_prompts: &NegativePromptTable,
) -> Vec<(String, Value)> {
    let mut fields = reference_fields(config, params);

    if params.width.is_none() && params.height.is_none() {
        if let Some(ratio) = &params.aspect_ratio {
            fields.extend(config.aspect_ratios.get(ratio).map_or_else(
                || {
                    vec![(
                        config.provider_field(ASPECT_RATIO_FIELD).to_owned(),
                        Value::from(ratio.as_str()),
                    )]
                },
                |dims| {
                    vec![
                        (
                            config.provider_field(WIDTH_FIELD).to_owned(),
                            Value::from(dims.width),
                        ),
                        (
                            config.provider_field(HEIGHT_FIELD).to_owned(),
                            Value::from(dims.height),
                        ),
                    ]
                },
            ));
        }
    }

    if let (Some(mode), Some(toggle)) = (params.content_mode, &config.safety) {
        fields.push((toggle.field.clone(), toggle.value_for(mode).clone()));
    }

    if params.negative_prompt.is_none() {
        let mode = params.content_mode.unwrap_or_default();
        if let Some(prompt) = negative_prompts.lookup(&config.model_family, mode) {
            fields.push((
                config.provider_field(NEGATIVE_PROMPT_FIELD).to_owned(),
                Value::from(prompt),
            ));
        }
    }

    fields
}

fn reference_fields(config: &ModelConfiguration, params: &CanonicalParams) -> Vec<(String, Value)> {
    let Some(reference) = &params.reference else {
        return Vec::new();
    };
    let Some(support) = &config.image_to_image else {
        tracing::debug!(
            model_id = %config.model_id,
            "model has no image-to-image support, dropping reference image"
        );
        return Vec::new();
    };
    let mut fields = vec![(
        support.image_field.clone(),
        Value::from(reference.url.as_str()),
    )];
    if let Some(value) = reference
        .strength
        .map(|strength| strength.value())
        .or(support.default_strength)
    {
        fields.push((support.strength_field.clone(), Value::from(value)));
    }
    fields
}
