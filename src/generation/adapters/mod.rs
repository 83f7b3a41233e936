//! Adapter implementations for generation job persistence.

pub mod memory;
pub mod postgres;
