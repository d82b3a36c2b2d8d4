use crate::image::DecodedImage;
use crate::models::ClassVocabulary;
use crate::Result;
use serde::Serialize;

/// 单个检测结果：类别 id 与置信度
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class_id: usize, confidence: f32) -> Self {
        Self { class_id, confidence }
    }

    /// 阈值比较是闭区间：置信度等于阈值的检测会被保留
    pub fn passes(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

/// 检测模型能力：给定图像与阈值，返回通过阈值的检测结果
///
/// 实现必须可以在多个线程间共享；若底层会话不可重入，由实现自行加锁。
pub trait DetectionModel: Send + Sync {
    /// 模型名称（用于日志与错误信息）
    fn name(&self) -> &str;

    /// 模型自己的类别表
    fn vocabulary(&self) -> &ClassVocabulary;

    /// 执行推理，只返回 `confidence >= threshold` 的检测
    fn infer(&self, image: &DecodedImage, threshold: f32) -> Result<Vec<Detection>>;
}
