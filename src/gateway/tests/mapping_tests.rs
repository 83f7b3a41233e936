//! Tests for mapping canonical parameters onto provider input.

use super::catalog;
use crate::gateway::domain::{FieldViolation, MappingError, ModelCatalog, ProviderInput};
use crate::generation::domain::{ContentMode, GenerationRequest, QualityTier};
use crate::generation::services::RequestNormalizer;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn models() -> ModelCatalog {
    catalog()
}

fn build(models: &ModelCatalog, request: GenerationRequest) -> Result<ProviderInput, MappingError> {
    let params = RequestNormalizer::default()
        .normalize(request)
        .expect("valid request");
    models.build_input(&params)
}

#[rstest]
fn no_reference_means_no_image_to_image_fields(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_quality(QualityTier::Fast),
    )
    .expect("maps");

    assert!(!input.contains("image"));
    assert!(!input.contains("prompt_strength"));
    assert_eq!(input.get("prompt"), Some(&json!("a sunset")));
}

#[rstest]
fn image_to_image_defaults_apply_without_reference_leak(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_parameter("prompt_strength", 0.4),
    )
    .expect("maps");

    assert!(!input.contains("prompt_strength"));
}

#[rstest]
fn reference_image_sets_image_and_strength(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_reference_image("https://cdn.example/ref.png")
            .with_strength(0.3),
    )
    .expect("maps");

    assert_eq!(input.get("image"), Some(&json!("https://cdn.example/ref.png")));
    assert_eq!(input.get("prompt_strength"), Some(&json!(0.3)));
}

#[rstest]
fn reference_without_strength_uses_model_default(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_reference_image("https://cdn.example/ref.png"),
    )
    .expect("maps");

    assert_eq!(input.get("prompt_strength"), Some(&json!(0.6)));
}

#[rstest]
fn reference_is_dropped_for_models_without_support(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("sdxl-lightning")
            .with_reference_image("https://cdn.example/ref.png")
            .with_strength(0.3),
    )
    .expect("reference is dropped, not rejected");

    assert!(!input.contains("image"));
    assert!(
        !input
            .as_map()
            .values()
            .any(|value| value == &json!("https://cdn.example/ref.png"))
    );
}

#[rstest]
#[case(QualityTier::Standard, 28)]
#[case(QualityTier::Fast, 12)]
#[case(QualityTier::High, 40)]
fn quality_preset_overlays_defaults(
    models: ModelCatalog,
    #[case] quality: QualityTier,
    #[case] steps: u32,
) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_quality(quality),
    )
    .expect("maps");

    assert_eq!(input.get("num_inference_steps"), Some(&json!(steps)));
    assert_eq!(input.get("output_format"), Some(&json!("webp")));
}

#[rstest]
fn explicit_values_beat_presets(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_quality(QualityTier::High)
            .with_parameter("steps", 30)
            .with_parameter("output_quality", 80),
    )
    .expect("maps");

    assert_eq!(input.get("num_inference_steps"), Some(&json!(30)));
    assert_eq!(input.get("output_quality"), Some(&json!(80)));
    assert!(!input.contains("steps"));
}

#[rstest]
fn aspect_ratio_resolves_dimensions(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_aspect_ratio("16:9"),
    )
    .expect("maps");

    assert_eq!(input.get("width"), Some(&json!(1344)));
    assert_eq!(input.get("height"), Some(&json!(768)));
    assert!(!input.contains("aspect_ratio"));
}

#[rstest]
fn explicit_dimensions_skip_aspect_ratio(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_aspect_ratio("16:9")
            .with_dimensions(800, 600),
    )
    .expect("maps");

    assert_eq!(input.get("width"), Some(&json!(800)));
    assert_eq!(input.get("height"), Some(&json!(600)));
}

#[rstest]
fn unknown_aspect_ratio_passes_through(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_aspect_ratio("21:9"),
    )
    .expect("maps");

    assert_eq!(input.get("aspect_ratio"), Some(&json!("21:9")));
    assert!(!input.contains("width"));
}

#[rstest]
#[case(ContentMode::Sfw, false)]
#[case(ContentMode::Nsfw, true)]
fn content_mode_sets_safety_toggle(
    models: ModelCatalog,
    #[case] mode: ContentMode,
    #[case] disabled: bool,
) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_content_mode(mode),
    )
    .expect("maps");

    assert_eq!(input.get("disable_safety_checker"), Some(&Value::Bool(disabled)));
}

#[rstest]
fn missing_content_mode_leaves_safety_default(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset").with_model("flux-dev"),
    )
    .expect("maps");

    assert!(!input.contains("disable_safety_checker"));
}

#[rstest]
#[case("sdxl-lightning", ContentMode::Sfw, "nsfw, nudity, blurry, watermark")]
#[case("flux-dev", ContentMode::Sfw, "blurry, low quality, watermark")]
#[case("flux-dev", ContentMode::Nsfw, "blurry, low quality")]
fn negative_prompt_defaults_by_family_and_mode(
    models: ModelCatalog,
    #[case] model: &str,
    #[case] mode: ContentMode,
    #[case] expected: &str,
) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model(model)
            .with_content_mode(mode),
    )
    .expect("maps");

    assert_eq!(input.get("negative_prompt"), Some(&json!(expected)));
}

#[rstest]
fn explicit_negative_prompt_wins(models: ModelCatalog) {
    let input = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("sdxl-lightning")
            .with_negative_prompt("people"),
    )
    .expect("maps");

    assert_eq!(input.get("negative_prompt"), Some(&json!("people")));
}

#[rstest]
fn rule_violations_are_collected(models: ModelCatalog) {
    let result = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_parameter("steps", 500)
            .with_reference_image("https://cdn.example/ref.png")
            .with_strength(0.99),
    );

    assert_eq!(
        result,
        Err(MappingError::Validation(vec![
            FieldViolation::new("steps", "must be at most 50"),
            FieldViolation::new("strength", "must be at most 0.95"),
        ]))
    );
}

#[rstest]
fn wrong_type_is_a_violation(models: ModelCatalog) {
    let result = build(
        &models,
        GenerationRequest::image("a sunset")
            .with_model("flux-dev")
            .with_parameter("steps", "many"),
    );

    assert_eq!(
        result,
        Err(MappingError::Validation(vec![FieldViolation::new(
            "steps",
            "must be of type integer"
        )]))
    );
}

#[rstest]
fn modality_mismatch_is_a_violation(models: ModelCatalog) {
    let result = build(
        &models,
        GenerationRequest::video("a sunset").with_model("flux-dev"),
    );

    let Err(MappingError::Validation(violations)) = result else {
        panic!("expected a validation error, got {result:?}");
    };
    assert_eq!(violations.first().map(|violation| violation.field.as_str()), Some("kind"));
}
