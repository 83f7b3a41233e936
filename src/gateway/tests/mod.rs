//! Unit tests for the gateway context.

mod catalog_tests;
mod mapping_tests;
mod submission_tests;

use crate::gateway::domain::ModelCatalog;

pub(super) const MODELS_JSON: &str = include_str!("../../../tests/fixtures/models.json");

pub(super) fn catalog() -> ModelCatalog {
    ModelCatalog::from_json_str(MODELS_JSON).expect("fixture catalogue is valid")
}
