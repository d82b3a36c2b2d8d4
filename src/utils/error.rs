use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FoodError {
    #[error("Only image files are allowed, got content type '{0}'")]
    InvalidContentType(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Inference failed in model '{model}': {message}")]
    Inference { model: String, message: String },

    #[error("Model artifact not found: {}", .0.display())]
    ModelMissing(PathBuf),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model '{model}' produced class id {class_id} outside its vocabulary")]
    UnknownClassId { model: String, class_id: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: at least {0} bytes received, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl FoodError {
    /// 将模型调用中的任意错误统一包装为推理失败
    pub fn into_inference_failure(self, model: &str) -> Self {
        match self {
            err @ FoodError::Inference { .. } => err,
            other => FoodError::Inference {
                model: model.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FoodError::InvalidContentType(_) => StatusCode::BAD_REQUEST,
            FoodError::Decode(_) => StatusCode::BAD_REQUEST,
            FoodError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FoodError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            FoodError::ModelMissing(_) | FoodError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FoodError::InvalidContentType(_) => "INVALID_CONTENT_TYPE",
            FoodError::Decode(_) => "IMAGE_DECODE_ERROR",
            FoodError::Inference { .. } => "INFERENCE_ERROR",
            FoodError::ModelMissing(_) => "MODEL_MISSING",
            FoodError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            FoodError::UnknownClassId { .. } => "UNKNOWN_CLASS_ID",
            FoodError::InvalidInput(_) => "INVALID_INPUT",
            FoodError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            FoodError::Config(_) => "CONFIG_ERROR",
            FoodError::Io(_) => "IO_ERROR",
            FoodError::Ort(_) => "ORT_ERROR",
            FoodError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for FoodError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}
