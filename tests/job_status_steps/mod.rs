//! Step definitions for job status transition scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
