//! Session-local workspace of generated outputs.
//!
//! The workspace holds outputs of completed jobs for the current session,
//! deduplicated by output URL and listed newest first. It is persisted to
//! session-scoped storage on a debounce, and discarded when the session
//! owner changes or the user signs out.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
