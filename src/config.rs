use crate::utils::error::FoodError;
use crate::Result;
use std::path::PathBuf;

pub const DEFAULT_PRIMARY_MODEL: &str = "arabic-food3.onnx";
pub const DEFAULT_FALLBACK_MODEL: &str = "food-101.onnx";
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// multipart 边界与各部分头部预留的字节数
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 主模型（专用模型）文件名
    pub primary_model: String,

    /// 回退模型（通用模型）文件名
    pub fallback_model: String,

    /// 推理工作线程数量（同时进行的推理请求上限）
    pub workers: usize,

    /// 默认置信度阈值
    pub default_threshold: f32,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 模型输入边长（正方形）
    pub input_size: usize,

    /// NMS IoU 阈值
    pub iou_threshold: f32,

    /// 单张图片最多保留的检测数
    pub max_detections: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 单张上传图片的最大字节数
    pub max_image_size: usize,

    /// 最大请求体大小（字节），需大于 `max_image_size` 以容纳 multipart 头部
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);

        let onnx_config = OnnxConfig {
            // 推理请求可能并行，每个会话只占用一部分核心
            intra_threads: (cpu_cores / 2).max(1),
            input_size: 640,
            iou_threshold: 0.7,
            max_detections: 300,
        };

        let max_image_size = 20 * 1024 * 1024; // 20MB
        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_image_size,
            max_request_size: max_image_size + MULTIPART_OVERHEAD,
        };

        let config = Self {
            bind_addr,
            models_dir: models_dir.into(),
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            workers,
            default_threshold: DEFAULT_THRESHOLD,
            dev_mode,
            onnx_config,
            server_config,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn with_model_files(mut self, primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.primary_model = primary.into();
        self.fallback_model = fallback.into();
        self
    }

    pub fn with_default_threshold(mut self, threshold: f32) -> Result<Self> {
        self.default_threshold = threshold;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(FoodError::Config("workers must be at least 1".to_string()));
        }

        if !is_valid_threshold(self.default_threshold) {
            return Err(FoodError::Config(format!(
                "default threshold must be within [0, 1], got {}",
                self.default_threshold
            )));
        }

        if !is_valid_threshold(self.onnx_config.iou_threshold) {
            return Err(FoodError::Config(format!(
                "IoU threshold must be within [0, 1], got {}",
                self.onnx_config.iou_threshold
            )));
        }

        if self.server_config.max_request_size <= self.server_config.max_image_size {
            return Err(FoodError::Config(format!(
                "max request size ({}) must exceed max image size ({})",
                self.server_config.max_request_size, self.server_config.max_image_size
            )));
        }

        if self.onnx_config.input_size == 0 || self.onnx_config.input_size % 32 != 0 {
            return Err(FoodError::Config(format!(
                "input size must be a positive multiple of 32, got {}",
                self.onnx_config.input_size
            )));
        }

        Ok(())
    }

    /// 获取主模型路径
    pub fn primary_model_path(&self) -> PathBuf {
        self.models_dir.join(&self.primary_model)
    }

    /// 获取回退模型路径
    pub fn fallback_model_path(&self) -> PathBuf {
        self.models_dir.join(&self.fallback_model)
    }
}

/// 阈值必须是 [0, 1] 范围内的有限数
pub fn is_valid_threshold(value: f32) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
