pub mod analysis;
pub mod config;
pub mod image;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use analysis::{AnalyzePipeline, AnalyzeRequest, AnalyzeResult, ModelRole};
pub use config::Config;
pub use models::{ModelRegistry, DetectionModel};
pub use utils::error::FoodError;

pub type Result<T> = std::result::Result<T, FoodError>;
