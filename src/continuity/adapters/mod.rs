//! Adapter implementations for scene persistence.

pub mod memory;
pub mod postgres;
