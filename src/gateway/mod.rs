//! Parameter mapping and provider submission.
//!
//! Canonical parameters are mapped onto a provider's input schema using a
//! typed, in-process model catalogue, then submitted through a
//! [`ports::GenerationProvider`] under a central retry policy. Provider
//! callbacks and status checks settle the job afterwards.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
