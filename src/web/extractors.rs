use crate::config::is_valid_threshold;
use crate::utils::error::FoodError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// 验证的查询参数提取器
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = FoodError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|err| FoodError::InvalidInput(err.body_text()))?;

        value.validate().map_err(FoodError::InvalidInput)?;

        Ok(ValidatedQuery(value))
    }
}

/// 验证trait
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// `/analyze` 的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    /// 置信度阈值，兼容旧参数名 `arabic_thresh`
    #[serde(default, alias = "arabic_thresh")]
    pub threshold: Option<f32>,
}

impl Validate for AnalyzeParams {
    fn validate(&self) -> Result<(), String> {
        match self.threshold {
            Some(threshold) if !is_valid_threshold(threshold) => {
                Err(format!("Threshold must be between 0.0 and 1.0, got {}", threshold))
            }
            _ => Ok(()),
        }
    }
}

/// 请求ID提取器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("X-Request-ID")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(RequestId(request_id))
    }
}
