use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{analyzer::EmotionAnalyzer, ui};

pub mod handlers;
pub mod types;

use handlers::{clear_log, download_log, list_models, log_summary, predict};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<EmotionAnalyzer>,
}

impl AppState {
    pub fn new(analyzer: Arc<EmotionAnalyzer>) -> Self {
        Self { analyzer }
    }
}

/// JSON API for programmatic clients.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/models", get(list_models))
        .route("/api/predict", post(predict))
        .route("/api/log", get(download_log).delete(clear_log))
        .route("/api/log/summary", get(log_summary))
}

/// The page, the JSON API and CORS, bound to `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(ui::ui_router())
        .merge(api_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}
