pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{analysis::AnalyzePipeline, models::ModelRegistry, utils::error::FoodError, Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: AnalyzePipeline,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<ModelRegistry>) -> Self {
        let pipeline = AnalyzePipeline::new(registry, config.server_config.max_image_size, config.workers);
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 模型缺失时在绑定端口之前失败
    let registry = Arc::new(ModelRegistry::load(&config)?);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|e| FoodError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e)))?;

    let app = create_app(AppState::new(config, registry));

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /analyze   - Multipart image upload (?threshold=0.5)");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  GET  /api/info  - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| FoodError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FoodError::Internal(format!("Server failed: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = &state.config.server_config;
    let max_request_size = server_config.max_request_size;
    let request_timeout = Duration::from_secs(server_config.request_timeout);

    Router::new()
        .route("/analyze", post(handlers::analyze_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        // 超限由 multipart 读取报告，处理器转换为 JSON 的 413
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .with_state(state)
}

/// 健康检查端点
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "Food Detection Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "default_threshold": state.config.default_threshold,
        "workers": state.config.workers,
        "models": state.pipeline.registry().stats(),
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
