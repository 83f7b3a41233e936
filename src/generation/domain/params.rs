//! Canonical, model-agnostic generation parameters.

use super::{ContentMode, GenerationDomainError, JobKind, ModelId, QualityTier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Canonical name of the prompt parameter.
pub const PROMPT_FIELD: &str = "prompt";
/// Canonical name of the negative prompt parameter.
pub const NEGATIVE_PROMPT_FIELD: &str = "negative_prompt";
/// Canonical name of the seed parameter.
pub const SEED_FIELD: &str = "seed";
/// Canonical name of the width parameter.
pub const WIDTH_FIELD: &str = "width";
/// Canonical name of the height parameter.
pub const HEIGHT_FIELD: &str = "height";
/// Canonical name of the aspect-ratio hint.
pub const ASPECT_RATIO_FIELD: &str = "aspect_ratio";

/// Validated, trimmed prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prompt(String);

impl Prompt {
    /// Creates a validated prompt.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::EmptyPrompt`] when the text is empty
    /// or whitespace-only.
    pub fn new(value: impl Into<String>) -> Result<Self, GenerationDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GenerationDomainError::EmptyPrompt);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the prompt text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Prompt {
    type Error = GenerationDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Prompt> for String {
    fn from(value: Prompt) -> Self {
        value.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image-to-image strength in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Strength(f64);

impl Strength {
    /// Creates a validated strength.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::StrengthOutOfRange`] when the value is
    /// not a finite number within `0.0..=1.0`.
    pub fn new(value: f64) -> Result<Self, GenerationDomainError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(GenerationDomainError::StrengthOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Strength {
    type Error = GenerationDomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Strength> for f64 {
    fn from(value: Strength) -> Self {
        value.0
    }
}

/// Deterministic generation seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(i64);

impl Seed {
    /// Wraps a seed value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the seed value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Trimmed, non-empty URL of a reference image or generated asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetUrl(String);

impl AssetUrl {
    /// Creates a validated asset URL.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationDomainError::EmptyUrl`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, GenerationDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GenerationDomainError::EmptyUrl);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the URL as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssetUrl {
    type Error = GenerationDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssetUrl> for String {
    fn from(value: AssetUrl) -> Self {
        value.0
    }
}

impl fmt::Display for AssetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference image used for image-to-image generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
    /// Source image URL.
    pub url: AssetUrl,
    /// Requested influence of the reference; `None` defers to the model's
    /// configured default.
    pub strength: Option<Strength>,
}

/// Free-form key/value bag carried on jobs for destination and context flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobMetadata(Map<String, Value>);

impl JobMetadata {
    /// Creates an empty metadata bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    #[must_use]
    pub const fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Adds or replaces an entry, returning the updated bag.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces an entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the string stored under `key`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the UUID stored under `key`, ignoring malformed values.
    #[must_use]
    pub fn get_uuid(&self, key: &str) -> Option<Uuid> {
        self.get_str(key).and_then(|raw| Uuid::parse_str(raw).ok())
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Normalized generation parameters, independent of any provider schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalParams {
    /// Output modality.
    pub kind: JobKind,
    /// Prompt text.
    pub prompt: Prompt,
    /// Chosen model.
    pub model_id: ModelId,
    /// Requested quality tier.
    pub quality: QualityTier,
    /// Optional reference image for image-to-image generation.
    pub reference: Option<ReferenceImage>,
    /// Optional deterministic seed.
    pub seed: Option<Seed>,
    /// Explicit output width in pixels.
    pub width: Option<u32>,
    /// Explicit output height in pixels.
    pub height: Option<u32>,
    /// Aspect-ratio hint such as `16:9`.
    pub aspect_ratio: Option<String>,
    /// Content mode used for safety toggles and negative-prompt defaults.
    pub content_mode: Option<ContentMode>,
    /// Explicit negative prompt.
    pub negative_prompt: Option<String>,
    /// Further user-supplied parameters keyed by canonical name.
    #[serde(default)]
    pub extra: Map<String, Value>,
    /// Destination and context flags.
    #[serde(default)]
    pub metadata: JobMetadata,
}

impl CanonicalParams {
    /// Returns every explicitly supplied parameter keyed by canonical name.
    ///
    /// Typed fields take precedence over entries of the same name in
    /// [`CanonicalParams::extra`]. The aspect-ratio hint and reference image
    /// are not included; the gateway resolves them separately.
    #[must_use]
    pub fn explicit_values(&self) -> Map<String, Value> {
        let mut values = self.extra.clone();
        values.insert(PROMPT_FIELD.to_owned(), Value::from(self.prompt.as_str()));
        if let Some(negative_prompt) = &self.negative_prompt {
            values.insert(
                NEGATIVE_PROMPT_FIELD.to_owned(),
                Value::from(negative_prompt.as_str()),
            );
        }
        if let Some(seed) = self.seed {
            values.insert(SEED_FIELD.to_owned(), Value::from(seed.value()));
        }
        if let Some(width) = self.width {
            values.insert(WIDTH_FIELD.to_owned(), Value::from(width));
        }
        if let Some(height) = self.height {
            values.insert(HEIGHT_FIELD.to_owned(), Value::from(height));
        }
        values
    }
}
