//! The set of known model configurations.

use super::{
    CatalogError, MappingError, ModelConfiguration, NegativePromptTable, ProviderInput,
    build_provider_input,
};
use crate::generation::domain::{CanonicalParams, ModelId};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    models: Vec<ModelConfiguration>,
    #[serde(default)]
    negative_prompts: NegativePromptTable,
}

/// Validated model configurations plus the negative-prompt table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelCatalog {
    models: IndexMap<ModelId, ModelConfiguration>,
    negative_prompts: NegativePromptTable,
}

impl ModelCatalog {
    /// Builds a catalogue, validating every configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateModel`] when two configurations
    /// share an identifier, or the first validation failure of any
    /// configuration.
    pub fn new(
        models: impl IntoIterator<Item = ModelConfiguration>,
        negative_prompts: NegativePromptTable,
    ) -> Result<Self, CatalogError> {
        let mut indexed = IndexMap::new();
        for config in models {
            config.validate()?;
            if indexed.contains_key(&config.model_id) {
                return Err(CatalogError::DuplicateModel(config.model_id));
            }
            indexed.insert(config.model_id.clone(), config);
        }
        Ok(Self {
            models: indexed,
            negative_prompts,
        })
    }

    /// Parses and validates a catalogue document.
    ///
    /// The document is an object with `models` and `negative_prompts`
    /// arrays.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and the errors of
    /// [`ModelCatalog::new`] otherwise.
    pub fn from_json_str(document: &str) -> Result<Self, CatalogError> {
        let parsed: CatalogDocument = serde_json::from_str(document)
            .map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::new(parsed.models, parsed.negative_prompts)
    }

    /// Looks up a model configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ConfigurationNotFound`] for unknown models.
    pub fn get(&self, model_id: &ModelId) -> Result<&ModelConfiguration, MappingError> {
        self.models
            .get(model_id)
            .ok_or_else(|| MappingError::ConfigurationNotFound(model_id.clone()))
    }

    /// Returns whether a model is configured.
    #[must_use]
    pub fn contains(&self, model_id: &ModelId) -> bool {
        self.models.contains_key(model_id)
    }

    /// Iterates over configurations in load order.
    pub fn models(&self) -> impl Iterator<Item = &ModelConfiguration> {
        self.models.values()
    }

    /// Returns the number of configured models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns whether no models are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Returns the negative-prompt table.
    #[must_use]
    pub const fn negative_prompts(&self) -> &NegativePromptTable {
        &self.negative_prompts
    }

    /// Resolves the model of `params` and builds its provider input.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ConfigurationNotFound`] for unknown models and
    /// [`MappingError::Validation`] for rule violations.
    pub fn build_input(&self, params: &CanonicalParams) -> Result<ProviderInput, MappingError> {
        let config = self.get(&params.model_id)?;
        build_provider_input(config, params, &self.negative_prompts)
    }
}
