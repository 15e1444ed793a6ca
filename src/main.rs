use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod analyzer;
mod api;
mod config;
mod emotion;
mod inference;
mod storage;
mod ui;

use analyzer::EmotionAnalyzer;
use api::AppState;
use config::AppConfig;
use inference::{CandleModelLoader, ModelChoice, ModelRegistry};
use storage::PredictionLog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    info!(?config, "starting emotion analyzer");

    // -----------------------------
    // Shared state
    // -----------------------------
    let loader = Arc::new(CandleModelLoader::from_config(&config));
    let registry = Arc::new(ModelRegistry::new(loader));
    let log = Arc::new(PredictionLog::new(config.log_path.clone()));
    info!(path = %log.path().display(), "prediction log");
    let analyzer = Arc::new(EmotionAnalyzer::new(registry, log));

    if config.preload {
        let analyzer = Arc::clone(&analyzer);
        tokio::spawn(async move {
            let choice = ModelChoice::default();
            if let Err(err) = analyzer.preload(choice).await {
                warn!(model_id = choice.model_id(), error = %err, "preload failed");
            }
        });
    }

    let app = api::app(AppState::new(analyzer));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "HTTP listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
