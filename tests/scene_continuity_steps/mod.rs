//! Step definitions for scene continuity scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
