//! Tests for request normalization.

use crate::generation::domain::{
    ContentMode, DefaultModels, GenerationDomainError, GenerationRequest, JobKind, ModelId,
    QualityTier,
};
use crate::generation::services::RequestNormalizer;
use eyre::{bail, ensure};
use rstest::{fixture, rstest};

#[fixture]
fn normalizer() -> RequestNormalizer {
    RequestNormalizer::new(DefaultModels {
        image: ModelId::new("img-default").expect("valid model"),
        video: ModelId::new("vid-default").expect("valid model"),
    })
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\n\t")]
fn blank_prompt_is_rejected(normalizer: RequestNormalizer, #[case] prompt: &str) {
    let result = normalizer.normalize(GenerationRequest::image(prompt));
    assert_eq!(result, Err(GenerationDomainError::EmptyPrompt));
}

#[rstest]
#[case(-0.01)]
#[case(1.5)]
#[case(f64::NAN)]
fn strength_outside_unit_range_is_rejected(normalizer: RequestNormalizer, #[case] strength: f64) {
    let request = GenerationRequest::image("a sunset")
        .with_reference_image("https://cdn.example/ref.png")
        .with_strength(strength);

    let result = normalizer.normalize(request);

    assert!(matches!(
        result,
        Err(GenerationDomainError::StrengthOutOfRange(_))
    ));
}

#[rstest]
#[case(JobKind::Image, "img-default")]
#[case(JobKind::Video, "vid-default")]
fn missing_model_falls_back_to_modality_default(
    normalizer: RequestNormalizer,
    #[case] kind: JobKind,
    #[case] expected: &str,
) -> eyre::Result<()> {
    let params = normalizer.normalize(GenerationRequest::new(kind, "a sunset").with_model("  "))?;
    ensure!(params.model_id.as_str() == expected);
    ensure!(params.kind == kind);
    Ok(())
}

#[rstest]
fn strength_without_reference_is_dropped(normalizer: RequestNormalizer) -> eyre::Result<()> {
    let params = normalizer.normalize(
        GenerationRequest::image("a sunset")
            .with_model("m1")
            .with_quality(QualityTier::Fast)
            .with_strength(0.4),
    )?;

    ensure!(params.reference.is_none());
    ensure!(params.quality == QualityTier::Fast);
    ensure!(params.model_id.as_str() == "m1");
    Ok(())
}

#[rstest]
fn reference_keeps_its_strength(normalizer: RequestNormalizer) -> eyre::Result<()> {
    let params = normalizer.normalize(
        GenerationRequest::image("a sunset")
            .with_reference_image(" https://cdn.example/ref.png ")
            .with_strength(0.35),
    )?;

    let Some(reference) = params.reference else {
        bail!("reference image should be kept");
    };
    ensure!(reference.url.as_str() == "https://cdn.example/ref.png");
    ensure!(reference.strength.map(f64::from) == Some(0.35));
    Ok(())
}

#[rstest]
fn optional_text_is_trimmed_and_blank_values_dropped(
    normalizer: RequestNormalizer,
) -> eyre::Result<()> {
    let params = normalizer.normalize(
        GenerationRequest::image("  a sunset  ")
            .with_negative_prompt("   ")
            .with_aspect_ratio(" 16:9 ")
            .with_reference_image("  ")
            .with_content_mode(ContentMode::Nsfw)
            .with_parameter("guidance", 4.5)
            .with_parameter("scheduler", serde_json::Value::Null),
    )?;

    ensure!(params.prompt.as_str() == "a sunset");
    ensure!(params.negative_prompt.is_none());
    ensure!(params.aspect_ratio.as_deref() == Some("16:9"));
    ensure!(params.reference.is_none());
    ensure!(params.content_mode == Some(ContentMode::Nsfw));
    ensure!(params.extra.contains_key("guidance"));
    ensure!(!params.extra.contains_key("scheduler"));
    Ok(())
}

#[rstest]
fn zero_dimension_is_rejected(normalizer: RequestNormalizer) {
    let result = normalizer.normalize(GenerationRequest::image("a sunset").with_dimensions(0, 512));
    assert_eq!(
        result,
        Err(GenerationDomainError::InvalidDimension { field: "width" })
    );
}

#[rstest]
fn metadata_is_carried_through(normalizer: RequestNormalizer) -> eyre::Result<()> {
    let params = normalizer.normalize(
        GenerationRequest::video("a drone shot").with_metadata("destination", "workspace"),
    )?;
    ensure!(params.metadata.get_str("destination") == Some("workspace"));
    Ok(())
}
