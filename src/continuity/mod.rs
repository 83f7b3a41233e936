//! Scene continuity across a conversation.
//!
//! Each conversation keeps a pointer to its most recent scene image so the
//! next generation can reuse it as an image-to-image reference. A scene can
//! exist before its image does; [`domain::PreviousScene`] keeps "no scene"
//! and "scene pending" apart.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
