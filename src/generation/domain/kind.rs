//! Generation modality, quality tier and content mode vocabularies.

use super::{ParseContentModeError, ParseJobKindError, ParseQualityTierError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output modality of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Still image generation.
    Image,
    /// Video generation.
    Video,
}

impl JobKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobKind {
    type Error = ParseJobKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(ParseJobKindError(value.to_owned())),
        }
    }
}

/// Requested quality tier. [`QualityTier::Standard`] is the baseline that
/// carries no preset overlay.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Fewer steps, quicker turnaround.
    Fast,
    /// Baseline provider defaults.
    #[default]
    Standard,
    /// More steps or larger output.
    High,
}

impl QualityTier {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Standard => "standard",
            Self::High => "high",
        }
    }

    /// Returns whether this tier is the baseline.
    #[must_use]
    pub const fn is_baseline(self) -> bool {
        matches!(self, Self::Standard)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for QualityTier {
    type Error = ParseQualityTierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "standard" => Ok(Self::Standard),
            "high" => Ok(Self::High),
            _ => Err(ParseQualityTierError(value.to_owned())),
        }
    }
}

/// Content mode used to pick safety toggles and negative-prompt defaults.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Safe-for-work output.
    #[default]
    Sfw,
    /// Unrestricted output where the provider allows it.
    Nsfw,
}

impl ContentMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sfw => "sfw",
            Self::Nsfw => "nsfw",
        }
    }
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ContentMode {
    type Error = ParseContentModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sfw" => Ok(Self::Sfw),
            "nsfw" => Ok(Self::Nsfw),
            _ => Err(ParseContentModeError(value.to_owned())),
        }
    }
}
