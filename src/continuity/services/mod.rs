//! Application services for scene continuity.

mod tracker;

pub use tracker::{
    ContinuityConfig, ContinuityListener, ContinuityUpdate, SceneContinuityTracker, TrackerError,
    TrackerResult,
};
