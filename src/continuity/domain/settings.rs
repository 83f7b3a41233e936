//! Continuity strength and toggle.

use super::SceneId;
use crate::generation::domain::AssetUrl;
use serde::{Deserialize, Serialize};

/// Lowest strength used for continuity seeding.
pub const MIN_CONTINUITY_STRENGTH: f64 = 0.2;
/// Highest strength used for continuity seeding.
pub const MAX_CONTINUITY_STRENGTH: f64 = 0.8;
const DEFAULT_CONTINUITY_STRENGTH: f64 = 0.5;

/// Image-to-image strength for continuity-seeded generations, always within
/// [`MIN_CONTINUITY_STRENGTH`]`..=`[`MAX_CONTINUITY_STRENGTH`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct ContinuityStrength(f64);

impl ContinuityStrength {
    /// Creates a strength, clamping out-of-range values. `NaN` falls back to
    /// the default strength.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(DEFAULT_CONTINUITY_STRENGTH);
        }
        Self(value.clamp(MIN_CONTINUITY_STRENGTH, MAX_CONTINUITY_STRENGTH))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for ContinuityStrength {
    fn default() -> Self {
        Self(DEFAULT_CONTINUITY_STRENGTH)
    }
}

impl From<f64> for ContinuityStrength {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<ContinuityStrength> for f64 {
    fn from(value: ContinuityStrength) -> Self {
        value.0
    }
}

/// User-facing continuity settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuitySettings {
    /// Whether continuity seeding is attempted at all.
    pub enabled: bool,
    /// Strength used for seeded generations.
    pub strength: ContinuityStrength,
}

impl Default for ContinuitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: ContinuityStrength::default(),
        }
    }
}

/// Reference image and strength to seed the next generation with.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuitySeed {
    /// Scene whose image is reused.
    pub scene_id: SceneId,
    /// Image to use as reference.
    pub image_url: AssetUrl,
    /// Strength to apply.
    pub strength: ContinuityStrength,
}
