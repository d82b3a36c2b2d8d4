use crate::{
    analysis::{AnalyzeRequest, AnalyzeResult, InferenceRouter, ModelRole, ResultExtractor},
    image::ImageDecoder,
    models::ModelRegistry,
    utils::error::FoodError,
    Result,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// 请求处理流水线：解码 -> 推理路由 -> 类别名称提取
///
/// 解码与推理都在阻塞线程池中执行，并由信号量限制同时运行的数量，
/// 慢推理不会阻塞异步运行时上的其他请求。
#[derive(Clone)]
pub struct AnalyzePipeline {
    registry: Arc<ModelRegistry>,
    decoder: Arc<ImageDecoder>,
    workers: Arc<Semaphore>,
}

/// 一次分析的完整输出
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOutcome {
    pub role: ModelRole,
    pub labels: AnalyzeResult,
}

impl AnalyzePipeline {
    pub fn new(registry: Arc<ModelRegistry>, max_image_bytes: usize, workers: usize) -> Self {
        Self {
            registry,
            decoder: Arc::new(ImageDecoder::new(max_image_bytes)),
            workers: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// 异步入口
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeOutcome> {
        let start_time = Instant::now();

        // 内容类型不需要解码，直接在当前任务上检查
        ImageDecoder::validate_content_type(&request.content_type)?;

        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|e| FoodError::Internal(format!("Inference worker pool closed: {}", e)))?;

        let registry = Arc::clone(&self.registry);
        let decoder = Arc::clone(&self.decoder);
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            Self::run(&registry, &decoder, &request)
        })
        .await
        .map_err(|e| FoodError::Internal(format!("Inference task failed: {}", e)))??;

        tracing::info!(
            "Analysis completed: model={}, labels={}, time={:.3}s",
            outcome.role,
            outcome.labels.len(),
            start_time.elapsed().as_secs_f32()
        );

        Ok(outcome)
    }

    /// 同步执行完整流水线（在阻塞线程上调用）
    pub fn run(registry: &ModelRegistry, decoder: &ImageDecoder, request: &AnalyzeRequest) -> Result<AnalyzeOutcome> {
        let image = decoder.decode(&request.image_bytes, &request.content_type)?;

        let routed = InferenceRouter::new(registry).route(&image, request.threshold)?;
        let labels = ResultExtractor::extract(registry, &routed)?;

        Ok(AnalyzeOutcome {
            role: routed.role,
            labels,
        })
    }
}
