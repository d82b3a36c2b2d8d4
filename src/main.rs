use anyhow::Result;
use clap::Parser;
use food_detect::{
    config::{Config, DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL, DEFAULT_THRESHOLD},
    web::serve,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "food-detect")]
#[command(about = "Food photo recognition service backed by two ONNX detection models")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Directory containing both model artifacts
    #[arg(long, env = "MODEL_DIR", default_value = "models")]
    models_dir: String,

    /// Specialized model file, tried first
    #[arg(long, default_value = DEFAULT_PRIMARY_MODEL)]
    primary_model: String,

    /// General-purpose model file, used when the primary finds nothing
    #[arg(long, default_value = DEFAULT_FALLBACK_MODEL)]
    fallback_model: String,

    /// Default confidence threshold when a request does not supply one
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f32,

    /// Maximum number of concurrent inferences
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with_target(false)
        .init();

    tracing::info!("Starting food detection service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Models directory: {}", args.models_dir);

    let config = Config::new(args.bind, args.models_dir, args.workers, args.dev)?
        .with_model_files(args.primary_model, args.fallback_model)
        .with_default_threshold(args.threshold)?;

    serve(config).await?;

    Ok(())
}
