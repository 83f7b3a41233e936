//! Studio facade tying the bounded contexts into one session.
//!
//! A [`Studio`] owns the job lifecycle, the workspace cache and the scene
//! continuity tracker for one owner. It exposes the operations a
//! presentation layer calls and broadcasts a [`StudioEvent`] for every
//! observable change.

mod error;
mod events;
mod facade;

pub use error::{StudioError, StudioResult};
pub use events::{GenerationTarget, StudioEvent};
pub use facade::{
    CONVERSATION_METADATA_KEY, DESTINATION_METADATA_KEY, SCENE_METADATA_KEY, Studio, StudioPorts,
    Submission,
};
