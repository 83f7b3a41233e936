//! Normalization of raw generation requests into canonical parameters.

use crate::generation::domain::{
    AssetUrl, CanonicalParams, DefaultModels, GenerationDomainError, GenerationRequest,
    HEIGHT_FIELD, ModelId, Prompt, ReferenceImage, Seed, Strength, WIDTH_FIELD,
};
use serde_json::{Map, Value};

/// Turns user requests into validated, model-agnostic parameters.
///
/// The normalizer is a pure transform: it never touches storage or the
/// network.
#[derive(Debug, Clone, Default)]
pub struct RequestNormalizer {
    defaults: DefaultModels,
}

impl RequestNormalizer {
    /// Creates a normalizer with per-modality fallback models.
    #[must_use]
    pub const fn new(defaults: DefaultModels) -> Self {
        Self { defaults }
    }

    /// Returns the fallback models.
    #[must_use]
    pub const fn defaults(&self) -> &DefaultModels {
        &self.defaults
    }

    /// Validates and canonicalizes a request.
    ///
    /// Reference strength is discarded when no reference image is supplied,
    /// so image-to-image fields never reach the provider without an image.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::EmptyPrompt`] for blank prompts,
    /// [`GenerationDomainError::StrengthOutOfRange`] for strengths outside
    /// `0.0..=1.0` and [`GenerationDomainError::InvalidDimension`] for zero
    /// width or height.
    pub fn normalize(
        &self,
        request: GenerationRequest,
    ) -> Result<CanonicalParams, GenerationDomainError> {
        let prompt_text = Prompt::new(request.prompt)?;
        let strength = request.strength.map(Strength::new).transpose()?;
        let width = positive_dimension(request.width, WIDTH_FIELD)?;
        let height = positive_dimension(request.height, HEIGHT_FIELD)?;

        let model_id = match non_blank(request.model) {
            Some(model) => ModelId::new(model)?,
            None => self.defaults.for_kind(request.kind).clone(),
        };

        let reference = non_blank(request.reference_image)
            .map(AssetUrl::new)
            .transpose()?
            .map(|url| ReferenceImage { url, strength });

        Ok(CanonicalParams {
            kind: request.kind,
            prompt: prompt_text,
            model_id,
            quality: request.quality,
            reference,
            seed: request.seed.map(Seed::new),
            width,
            height,
            aspect_ratio: non_blank(request.aspect_ratio),
            content_mode: request.content_mode,
            negative_prompt: non_blank(request.negative_prompt),
            extra: without_nulls(request.extra),
            metadata: request.metadata,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn positive_dimension(
    value: Option<u32>,
    field: &'static str,
) -> Result<Option<u32>, GenerationDomainError> {
    match value {
        Some(0) => Err(GenerationDomainError::InvalidDimension { field }),
        other => Ok(other),
    }
}

fn without_nulls(extra: Map<String, Value>) -> Map<String, Value> {
    extra
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect()
}
