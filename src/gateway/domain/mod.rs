//! Domain model for mapping canonical parameters onto provider requests.
//!
//! A [`ModelCatalog`] holds one [`ModelConfiguration`] per model, loaded
//! once from JSON and validated up front. [`build_provider_input`] is the
//! pure mapping step; it never touches the network.

mod catalog;
mod config;
mod error;
mod mapping;
mod negative;

pub use catalog::ModelCatalog;
pub use config::{
    DEFAULT_ERROR_MESSAGE_KEY, Dimensions, ImageToImageSupport, ModelConfiguration, ParameterRule,
    SafetyToggle, ValueType,
};
pub use error::{CatalogError, FieldViolation, MappingError};
pub use mapping::{ProviderInput, build_provider_input};
pub use negative::{NegativePromptEntry, NegativePromptTable, WILDCARD_FAMILY};
