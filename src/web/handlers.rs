use crate::{
    analysis::AnalyzeRequest,
    image::ImageDecoder,
    utils::error::FoodError,
    web::{
        extractors::{AnalyzeParams, RequestId, ValidatedQuery},
        AppState,
    },
    Result,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use std::time::Instant;

/// 响应头：标记最终结果来自哪个模型
pub const MODEL_ROLE_HEADER: HeaderName = HeaderName::from_static("x-detection-model");

/// Multipart文件上传处理器
pub async fn analyze_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedQuery(params): ValidatedQuery<AnalyzeParams>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let start_time = Instant::now();
    let threshold = params.threshold.unwrap_or(state.config.default_threshold);

    tracing::info!(
        "Processing analyze request: request_id={}, threshold={}",
        request_id,
        threshold
    );

    let max_image_size = state.config.server_config.max_image_size;
    let mut upload: Option<(Bytes, String)> = None;

    // 解析multipart数据
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart field", 0, max_image_size))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();

        // 内容类型不对就不读取文件内容
        ImageDecoder::validate_content_type(&content_type)?;

        // 分块读取，超过图片上限立即停止，不把整个请求体读进内存
        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, "Failed to read file data", data.len(), max_image_size))?
        {
            if data.len() + chunk.len() > max_image_size {
                return Err(FoodError::FileTooLarge(data.len() + chunk.len(), max_image_size));
            }
            data.extend_from_slice(&chunk);
        }
        let data = Bytes::from(data);

        tracing::debug!("Received file: {} bytes, content type {}", data.len(), content_type);
        upload = Some((data, content_type));
    }

    let (image_bytes, content_type) =
        upload.ok_or_else(|| FoodError::InvalidInput("No image file provided".to_string()))?;

    let outcome = state
        .pipeline
        .analyze(AnalyzeRequest::new(image_bytes, content_type, threshold))
        .await?;

    tracing::info!(
        "Analyze completed: request_id={}, model={}, labels={:?}, time={:.3}s",
        request_id,
        outcome.role,
        outcome.labels,
        start_time.elapsed().as_secs_f32()
    );

    let role = HeaderValue::from_static(outcome.role.as_str());
    Ok(([(MODEL_ROLE_HEADER, role)], Json(outcome.labels)))
}

/// 请求体超出上限时 multipart 读取会失败，这种情况统一报告为文件过大
fn multipart_error(err: MultipartError, context: &str, received: usize, max_image_size: usize) -> FoodError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FoodError::FileTooLarge(received, max_image_size)
    } else {
        FoodError::InvalidInput(format!("{}: {}", context, err))
    }
}
