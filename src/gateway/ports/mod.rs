//! Port contracts for external generation providers.

pub mod provider;

pub use provider::{
    GenerationProvider, PredictionStatus, ProviderError, ProviderPrediction, ProviderRequest,
    ProviderResult,
};
