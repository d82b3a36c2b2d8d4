use crate::models::Detection;
use axum::body::Bytes;
use serde::Serialize;
use std::fmt;

/// 产出最终检测结果的模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Primary,
    Fallback,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Primary => "primary",
            ModelRole::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 路由结果：恰好来自一个模型的检测序列
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedDetections {
    pub role: ModelRole,
    pub detections: Vec<Detection>,
}

/// 单次分析请求
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub image_bytes: Bytes,
    pub content_type: String,
    pub threshold: f32,
}

impl AnalyzeRequest {
    pub fn new(image_bytes: impl Into<Bytes>, content_type: impl Into<String>, threshold: f32) -> Self {
        Self {
            image_bytes: image_bytes.into(),
            content_type: content_type.into(),
            threshold,
        }
    }
}

/// 分析结果：按检测顺序排列的类别名称，允许重复
pub type AnalyzeResult = Vec<String>;
