//! Tests for catalogue loading and validation.

use super::catalog;
use crate::gateway::domain::{CatalogError, MappingError, ModelCatalog};
use crate::generation::domain::{ContentMode, ModelId};
use rstest::rstest;
use serde_json::{Value, json};

fn with_model(model: Value) -> String {
    json!({ "models": [model] }).to_string()
}

fn minimal_model() -> Value {
    json!({
        "model_id": "m1",
        "provider": "acme/m1",
        "model_family": "acme",
        "kind": "image"
    })
}

#[rstest]
fn fixture_loads_every_model() {
    let loaded = catalog();
    assert_eq!(loaded.len(), 3);
    assert!(loaded.contains(&ModelId::from_static("flux-dev")));
    assert_eq!(
        loaded.negative_prompts().lookup("sdxl", ContentMode::Sfw),
        Some("nsfw, nudity, blurry, watermark")
    );
    assert_eq!(
        loaded.negative_prompts().lookup("flux", ContentMode::Nsfw),
        Some("blurry, low quality")
    );
}

#[rstest]
fn unknown_model_is_configuration_not_found() {
    let missing = ModelId::from_static("nope");
    assert_eq!(
        catalog().get(&missing).err(),
        Some(MappingError::ConfigurationNotFound(missing))
    );
}

#[rstest]
fn duplicate_models_are_rejected() {
    let document = json!({ "models": [minimal_model(), minimal_model()] }).to_string();
    assert_eq!(
        ModelCatalog::from_json_str(&document),
        Err(CatalogError::DuplicateModel(ModelId::from_static("m1")))
    );
}

#[rstest]
fn malformed_json_is_a_parse_error() {
    let result = ModelCatalog::from_json_str("{ \"models\": [");
    assert!(matches!(result, Err(CatalogError::Parse(_))));
}

#[rstest]
#[case::zero_dimension(
    json!({ "aspect_ratios": { "4:3": { "width": 0, "height": 768 } } }),
    "InvalidDimensions"
)]
#[case::blank_image_field(
    json!({ "image_to_image": { "image_field": " ", "strength_field": "strength" } }),
    "EmptyFieldName"
)]
#[case::strength_out_of_range(
    json!({ "image_to_image": { "image_field": "image", "strength_field": "strength", "default_strength": 1.5 } }),
    "DefaultStrengthOutOfRange"
)]
#[case::bad_message_key(
    json!({ "error_messages": { "teapot": "short and stout" } }),
    "InvalidMessageKey"
)]
#[case::bad_template(
    json!({ "error_messages": { "500": "{{ message " } }),
    "InvalidTemplate"
)]
fn invalid_configurations_are_rejected(#[case] overrides: Value, #[case] expected: &str) {
    let mut model = minimal_model();
    if let (Some(target), Some(extra)) = (model.as_object_mut(), overrides.as_object()) {
        target.extend(extra.clone());
    }

    let result = ModelCatalog::from_json_str(&with_model(model));

    let Err(err) = result else {
        panic!("expected {expected}, catalogue loaded");
    };
    assert!(
        format!("{err:?}").starts_with(expected),
        "expected {expected}, got {err:?}"
    );
}
