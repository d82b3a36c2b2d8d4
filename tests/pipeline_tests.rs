mod common;

use common::{png_bytes, Fixture, ScriptedModel};
use food_detect::analysis::{AnalyzePipeline, AnalyzeRequest, InferenceRouter, ModelRole, ResultExtractor};
use food_detect::image::{DecodedImage, ImageDecoder};
use food_detect::models::Detection;
use food_detect::FoodError;
use image::RgbImage;
use std::sync::Arc;

const MAX_BYTES: usize = 1024 * 1024;

fn pixels() -> DecodedImage {
    DecodedImage::new(RgbImage::new(4, 4))
}

fn pipeline(fixture: &Fixture) -> AnalyzePipeline {
    AnalyzePipeline::new(Arc::clone(&fixture.registry), MAX_BYTES, 2)
}

#[test]
fn primary_hit_skips_fallback() {
    let fixture = Fixture::liver_and_beef();
    let routed = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.5).unwrap();

    assert_eq!(routed.role, ModelRole::Primary);
    assert_eq!(routed.detections, vec![Detection::new(1, 0.6)]);
    assert_eq!(fixture.primary.calls(), 1);
    assert_eq!(fixture.fallback.calls(), 0);
}

#[test]
fn empty_primary_falls_back_with_same_threshold() {
    let fixture = Fixture::liver_and_beef();
    let routed = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.9).unwrap();

    assert_eq!(routed.role, ModelRole::Fallback);
    assert_eq!(fixture.primary.thresholds(), vec![0.9]);
    assert_eq!(fixture.fallback.thresholds(), vec![0.9]);
}

#[test]
fn empty_fallback_is_still_final() {
    let fixture = Fixture::new(
        ScriptedModel::new("arabic-food3", &["كبدة"], vec![Detection::new(0, 0.2)]),
        ScriptedModel::new("food-101", &["beef"], vec![Detection::new(0, 0.3)]),
    );
    let routed = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.5).unwrap();

    assert_eq!(routed.role, ModelRole::Fallback);
    assert!(routed.detections.is_empty());
    assert_eq!(fixture.model_calls(), 2);
}

#[test]
fn threshold_boundary_is_inclusive() {
    let fixture = Fixture::liver_and_beef();
    let routed = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.6).unwrap();

    assert_eq!(routed.role, ModelRole::Primary);
    assert_eq!(fixture.fallback.calls(), 0);
}

#[test]
fn primary_failure_does_not_trigger_fallback() {
    let fixture = Fixture::new(
        ScriptedModel::failing("arabic-food3", &["كبدة"]),
        ScriptedModel::new("food-101", &["beef"], vec![Detection::new(0, 0.9)]),
    );
    let err = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.5).unwrap_err();

    match err {
        FoodError::Inference { model, message } => {
            assert_eq!(model, "arabic-food3");
            assert!(message.contains("session crashed"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fixture.fallback.calls(), 0);
}

#[test]
fn fallback_failure_is_an_inference_error() {
    let fixture = Fixture::new(
        ScriptedModel::new("arabic-food3", &["كبدة"], Vec::new()),
        ScriptedModel::failing("food-101", &["beef"]),
    );
    let err = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.5).unwrap_err();
    assert!(matches!(err, FoodError::Inference { ref model, .. } if model == "food-101"));
}

#[test]
fn labels_follow_detection_order_with_duplicates() {
    let fixture = Fixture::new(
        ScriptedModel::new(
            "arabic-food3",
            &["فول", "كبدة", "حمص"],
            vec![
                Detection::new(2, 0.55),
                Detection::new(1, 0.9),
                Detection::new(2, 0.7),
            ],
        ),
        ScriptedModel::new("food-101", &["beef"], Vec::new()),
    );
    let routed = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.5).unwrap();
    let labels = ResultExtractor::extract(&fixture.registry, &routed).unwrap();

    assert_eq!(labels, vec!["حمص", "كبدة", "حمص"]);
}

#[test]
fn labels_use_producing_models_vocabulary() {
    let fixture = Fixture::new(
        ScriptedModel::new("arabic-food3", &["كبدة", "فول"], Vec::new()),
        ScriptedModel::new("food-101", &["apple_pie", "beef"], vec![Detection::new(1, 0.8)]),
    );
    let routed = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.5).unwrap();
    let labels = ResultExtractor::extract(&fixture.registry, &routed).unwrap();

    assert_eq!(labels, vec!["beef"]);
}

#[test]
fn unknown_class_id_is_a_named_error() {
    let fixture = Fixture::new(
        ScriptedModel::new("arabic-food3", &["كبدة"], vec![Detection::new(7, 0.8)]),
        ScriptedModel::new("food-101", &["beef"], Vec::new()),
    );
    let routed = InferenceRouter::new(&fixture.registry).route(&pixels(), 0.5).unwrap();
    let err = ResultExtractor::extract(&fixture.registry, &routed).unwrap_err();

    assert!(matches!(
        err,
        FoodError::UnknownClassId { ref model, class_id: 7 } if model == "arabic-food3"
    ));
}

#[tokio::test]
async fn scenario_a_primary_label_returned() {
    let fixture = Fixture::liver_and_beef();
    let outcome = pipeline(&fixture)
        .analyze(AnalyzeRequest::new(png_bytes(16, 16), "image/jpeg", 0.5))
        .await
        .unwrap();

    assert_eq!(outcome.role, ModelRole::Primary);
    assert_eq!(outcome.labels, vec!["كبدة"]);
    assert_eq!(fixture.fallback.calls(), 0);
}

#[tokio::test]
async fn scenario_b_high_threshold_uses_fallback() {
    let fixture = Fixture::liver_and_beef();
    let outcome = pipeline(&fixture)
        .analyze(AnalyzeRequest::new(png_bytes(16, 16), "image/png", 0.9))
        .await
        .unwrap();

    assert_eq!(outcome.role, ModelRole::Fallback);
    assert_eq!(outcome.labels, vec!["beef"]);
    assert_eq!(fixture.fallback.thresholds(), vec![0.9]);
}

#[tokio::test]
async fn scenario_c_corrupt_upload_invokes_no_model() {
    let fixture = Fixture::liver_and_beef();
    let err = pipeline(&fixture)
        .analyze(AnalyzeRequest::new(b"\x89PNG\r\n\x1a\nnot really".to_vec(), "image/png", 0.5))
        .await
        .unwrap_err();

    assert!(matches!(err, FoodError::Decode(_)));
    assert_eq!(fixture.model_calls(), 0);
}

#[tokio::test]
async fn non_image_content_type_invokes_no_model() {
    let fixture = Fixture::liver_and_beef();
    let err = pipeline(&fixture)
        .analyze(AnalyzeRequest::new(png_bytes(8, 8), "application/octet-stream", 0.5))
        .await
        .unwrap_err();

    assert!(matches!(err, FoodError::InvalidContentType(_)));
    assert_eq!(fixture.model_calls(), 0);
}

#[tokio::test]
async fn concurrent_requests_share_the_registry() {
    let fixture = Fixture::liver_and_beef();
    let pipeline = pipeline(&fixture);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = pipeline.clone();
            let threshold = if i % 2 == 0 { 0.5 } else { 0.9 };
            tokio::spawn(async move {
                pipeline
                    .analyze(AnalyzeRequest::new(png_bytes(8, 8), "image/png", threshold))
                    .await
            })
        })
        .collect();

    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.labels.len(), 1);
    }

    assert_eq!(fixture.primary.calls(), 8);
    assert_eq!(fixture.fallback.calls(), 4);
}

#[test]
fn synchronous_run_matches_async_path() {
    let fixture = Fixture::liver_and_beef();
    let decoder = ImageDecoder::new(MAX_BYTES);
    let outcome = AnalyzePipeline::run(
        &fixture.registry,
        &decoder,
        &AnalyzeRequest::new(png_bytes(8, 8), "image/png", 0.5),
    )
    .unwrap();

    assert_eq!(outcome.labels, vec!["كبدة"]);
}
