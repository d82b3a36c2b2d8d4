use crate::analysis::{ModelRole, RoutedDetections};
use crate::image::DecodedImage;
use crate::models::{Detection, DetectionModel, ModelRegistry};
use crate::Result;

/// 先用专用模型推理，没有任何检测通过阈值时才调用通用模型
pub struct InferenceRouter<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> InferenceRouter<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn route(&self, image: &DecodedImage, threshold: f32) -> Result<RoutedDetections> {
        let primary = self.registry.primary();
        let detections = Self::infer(primary, image, threshold)?;

        if !detections.is_empty() {
            tracing::debug!(
                "Primary model '{}' produced {} detections, skipping fallback",
                primary.name(),
                detections.len()
            );
            return Ok(RoutedDetections {
                role: ModelRole::Primary,
                detections,
            });
        }

        // 回退模型与主模型使用同一个阈值；结果即使为空也作为最终结果
        let fallback = self.registry.fallback();
        tracing::debug!(
            "Primary model '{}' found nothing at threshold {}, falling back to '{}'",
            primary.name(),
            threshold,
            fallback.name()
        );
        let detections = Self::infer(fallback, image, threshold)?;

        Ok(RoutedDetections {
            role: ModelRole::Fallback,
            detections,
        })
    }

    fn infer(model: &dyn DetectionModel, image: &DecodedImage, threshold: f32) -> Result<Vec<Detection>> {
        model
            .infer(image, threshold)
            .map_err(|e| e.into_inference_failure(model.name()))
    }
}
