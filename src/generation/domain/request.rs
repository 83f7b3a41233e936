//! Raw user-facing generation requests and per-modality model defaults.

use super::{ContentMode, JobKind, JobMetadata, ModelId, QualityTier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generation request as submitted by a user, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub(crate) kind: JobKind,
    pub(crate) prompt: String,
    pub(crate) model: Option<String>,
    pub(crate) quality: QualityTier,
    pub(crate) reference_image: Option<String>,
    pub(crate) strength: Option<f64>,
    pub(crate) seed: Option<i64>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) aspect_ratio: Option<String>,
    pub(crate) content_mode: Option<ContentMode>,
    pub(crate) negative_prompt: Option<String>,
    pub(crate) extra: Map<String, Value>,
    pub(crate) metadata: JobMetadata,
}

impl GenerationRequest {
    /// Creates a request with the required prompt and modality.
    #[must_use]
    pub fn new(kind: JobKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            model: None,
            quality: QualityTier::default(),
            reference_image: None,
            strength: None,
            seed: None,
            width: None,
            height: None,
            aspect_ratio: None,
            content_mode: None,
            negative_prompt: None,
            extra: Map::new(),
            metadata: JobMetadata::new(),
        }
    }

    /// Creates an image request.
    #[must_use]
    pub fn image(prompt: impl Into<String>) -> Self {
        Self::new(JobKind::Image, prompt)
    }

    /// Creates a video request.
    #[must_use]
    pub fn video(prompt: impl Into<String>) -> Self {
        Self::new(JobKind::Video, prompt)
    }

    /// Selects a model explicitly.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the quality tier.
    #[must_use]
    pub const fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    /// Sets a reference image for image-to-image generation.
    #[must_use]
    pub fn with_reference_image(mut self, url: impl Into<String>) -> Self {
        self.reference_image = Some(url.into());
        self
    }

    /// Sets the image-to-image strength.
    #[must_use]
    pub const fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets explicit output dimensions.
    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets an aspect-ratio hint such as `16:9`.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    /// Sets the content mode.
    #[must_use]
    pub const fn with_content_mode(mut self, mode: ContentMode) -> Self {
        self.content_mode = Some(mode);
        self
    }

    /// Sets an explicit negative prompt.
    #[must_use]
    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    /// Adds a further canonical parameter, for example `steps`.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Returns the requested modality.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    /// Returns whether a reference image was supplied.
    #[must_use]
    pub fn has_reference_image(&self) -> bool {
        self.reference_image
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// Models used when a request does not name one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultModels {
    /// Default image model.
    pub image: ModelId,
    /// Default video model.
    pub video: ModelId,
}

impl DefaultModels {
    /// Returns the default model for `kind`.
    #[must_use]
    pub const fn for_kind(&self, kind: JobKind) -> &ModelId {
        match kind {
            JobKind::Image => &self.image,
            JobKind::Video => &self.video,
        }
    }
}

impl Default for DefaultModels {
    fn default() -> Self {
        Self {
            image: ModelId::from_static("flux-dev"),
            video: ModelId::from_static("wan-2.1-t2v"),
        }
    }
}
