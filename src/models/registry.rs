use crate::analysis::ModelRole;
use crate::models::{DetectionModel, YoloDetector};
use crate::utils::error::FoodError;
use crate::{Config, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// 持有主模型与回退模型，启动时构建一次，之后只读
pub struct ModelRegistry {
    primary: Arc<dyn DetectionModel>,
    fallback: Arc<dyn DetectionModel>,
    primary_path: Option<PathBuf>,
    fallback_path: Option<PathBuf>,
}

impl ModelRegistry {
    /// 从模型目录加载两个模型；任一文件缺失即启动失败
    pub fn load(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model registry from {}", config.models_dir.display());

        let primary_path = config.primary_model_path();
        let fallback_path = config.fallback_model_path();

        // 两个文件都存在才开始加载，避免只加载了一半
        for path in [&primary_path, &fallback_path] {
            if !path.exists() {
                tracing::error!("Model artifact missing: {}", path.display());
                return Err(FoodError::ModelMissing(path.clone()));
            }
        }

        let primary = YoloDetector::load(&primary_path, &config.onnx_config)?;
        let fallback = YoloDetector::load(&fallback_path, &config.onnx_config)?;

        let mut registry = Self::new(Arc::new(primary), Arc::new(fallback));
        registry.primary_path = Some(primary_path);
        registry.fallback_path = Some(fallback_path);

        tracing::info!(
            "Model registry initialized: primary='{}' ({} classes), fallback='{}' ({} classes)",
            registry.primary.name(),
            registry.primary.vocabulary().len(),
            registry.fallback.name(),
            registry.fallback.vocabulary().len()
        );
        Ok(registry)
    }

    /// 用已构建的模型组装（依赖注入）
    pub fn new(primary: Arc<dyn DetectionModel>, fallback: Arc<dyn DetectionModel>) -> Self {
        Self {
            primary,
            fallback,
            primary_path: None,
            fallback_path: None,
        }
    }

    pub fn primary(&self) -> &dyn DetectionModel {
        self.primary.as_ref()
    }

    pub fn fallback(&self) -> &dyn DetectionModel {
        self.fallback.as_ref()
    }

    pub fn get(&self, role: ModelRole) -> &dyn DetectionModel {
        match role {
            ModelRole::Primary => self.primary(),
            ModelRole::Fallback => self.fallback(),
        }
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            primary: ModelStats {
                name: self.primary.name().to_string(),
                path: self.primary_path.clone(),
                classes: self.primary.vocabulary().len(),
            },
            fallback: ModelStats {
                name: self.fallback.name().to_string(),
                path: self.fallback_path.clone(),
                classes: self.fallback.vocabulary().len(),
            },
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub classes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub primary: ModelStats,
    pub fallback: ModelStats,
}
