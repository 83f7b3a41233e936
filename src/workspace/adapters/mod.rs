//! Adapter implementations for session storage.

pub mod directory;
pub mod memory;
