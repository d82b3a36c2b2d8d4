use crate::analysis::{AnalyzeResult, RoutedDetections};
use crate::models::ModelRegistry;
use crate::utils::error::FoodError;
use crate::Result;

pub struct ResultExtractor;

impl ResultExtractor {
    /// 用产出检测的那个模型的类别表，把类别 id 映射为名称，保持顺序
    pub fn extract(registry: &ModelRegistry, routed: &RoutedDetections) -> Result<AnalyzeResult> {
        let model = registry.get(routed.role);
        let vocabulary = model.vocabulary();

        routed
            .detections
            .iter()
            .map(|detection| {
                vocabulary
                    .name(detection.class_id)
                    .map(str::to_string)
                    .ok_or_else(|| FoodError::UnknownClassId {
                        model: model.name().to_string(),
                        class_id: detection.class_id,
                    })
            })
            .collect()
    }
}
