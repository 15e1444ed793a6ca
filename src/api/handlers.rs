use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::{
    analyzer::{PredictOutcome, EMPTY_INPUT_WARNING},
    api::{
        types::{
            ClearResponse, ErrorResponse, LogSummaryResponse, ModelInfo, PredictRequest,
            PredictResponse, WarningResponse,
        },
        AppState,
    },
    inference::ModelChoice,
    storage::{ClearOutcome, LogSummary, PredictionLog},
};

pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    let loaded = state.analyzer.registry().loaded();
    Json(
        ModelChoice::ALL
            .iter()
            .map(|choice| ModelInfo {
                choice: *choice,
                label: choice.label(),
                model_id: choice.model_id(),
                loaded: loaded.iter().any(|id| id == choice.model_id()),
            })
            .collect(),
    )
}

pub async fn predict(State(state): State<AppState>, Json(req): Json<PredictRequest>) -> Response {
    let choice = req
        .language
        .as_deref()
        .map(ModelChoice::from_ui)
        .unwrap_or_default();

    match state.analyzer.predict(&req.text, choice).await {
        Ok(PredictOutcome::Predicted(report)) => {
            Json(PredictResponse::from(&report)).into_response()
        }
        Ok(PredictOutcome::EmptyInput) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(WarningResponse {
                warning: EMPTY_INPUT_WARNING.to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!(model_id = choice.model_id(), error = %err, "prediction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("{err:#}"),
                }),
            )
                .into_response()
        }
    }
}

pub async fn download_log(State(state): State<AppState>) -> Response {
    csv_download(state.analyzer.log()).await
}

pub async fn log_summary(State(state): State<AppState>) -> Json<LogSummaryResponse> {
    let body = match state.analyzer.log().summary_async().await {
        LogSummary::Missing => LogSummaryResponse {
            exists: false,
            rows: None,
            error: None,
        },
        LogSummary::Rows(n) => LogSummaryResponse {
            exists: true,
            rows: Some(n),
            error: None,
        },
        LogSummary::Unreadable(err) => LogSummaryResponse {
            exists: true,
            rows: None,
            error: Some(err),
        },
    };
    Json(body)
}

pub async fn clear_log(State(state): State<AppState>) -> Response {
    match state.analyzer.log().clear_async().await {
        Ok(outcome) => Json(ClearResponse {
            cleared: outcome == ClearOutcome::Removed,
            message: outcome.message(),
        })
        .into_response(),
        Err(err) => {
            error!(error = %err, "failed to clear prediction log");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("{err:#}"),
                }),
            )
                .into_response()
        }
    }
}

/// Serves the current log bytes as a CSV attachment.
pub async fn csv_download(log: &Arc<PredictionLog>) -> Response {
    match log.read_bytes_async().await {
        Ok(Some(bytes)) => {
            let disposition = HeaderValue::from_str(&format!(
                "attachment; filename=\"{}\"",
                log.file_name()
            ))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
            (
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "No predictions saved yet.").into_response(),
        Err(err) => {
            warn!(error = %err, "could not read prediction log for download");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Could not load CSV log: {err:#}"),
            )
                .into_response()
        }
    }
}
