//! HTTP adapter for prediction-style provider APIs.

mod client;
mod wire;

pub use client::{HttpGenerationProvider, HttpProviderConfig};
pub use wire::decode_prediction;
