pub mod render;

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    analyzer::{PredictOutcome, EMPTY_INPUT_WARNING},
    api::{handlers::csv_download, AppState},
    inference::ModelChoice,
    storage::ClearOutcome,
};
use render::PageView;

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearForm {
    #[serde(default)]
    pub language: Option<String>,
}

pub fn ui_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_page))
        .route("/clear", post(clear_page))
        .route("/download", get(download))
}

async fn index(State(state): State<AppState>) -> Response {
    render(StatusCode::OK, page(&state, ModelChoice::default(), "").await)
}

async fn predict_page(State(state): State<AppState>, Form(form): Form<PredictForm>) -> Response {
    let choice = ModelChoice::from_ui(&form.language);

    match state.analyzer.predict(&form.text, choice).await {
        Ok(PredictOutcome::EmptyInput) => render(
            StatusCode::OK,
            page(&state, choice, &form.text).await.with_warning(EMPTY_INPUT_WARNING),
        ),
        Ok(PredictOutcome::Predicted(report)) => render(
            StatusCode::OK,
            page(&state, choice, &form.text).await.with_report(&report),
        ),
        Err(err) => {
            error!(model_id = choice.model_id(), error = %err, "prediction failed");
            render(
                StatusCode::INTERNAL_SERVER_ERROR,
                page(&state, choice, &form.text).await.with_error(format!("{err:#}")),
            )
        }
    }
}

async fn clear_page(State(state): State<AppState>, Form(form): Form<ClearForm>) -> Response {
    let choice = form
        .language
        .as_deref()
        .map(ModelChoice::from_ui)
        .unwrap_or_default();

    match state.analyzer.log().clear_async().await {
        Ok(outcome @ ClearOutcome::Removed) => {
            render(StatusCode::OK, page(&state, choice, "").await.with_success(outcome.message()))
        }
        Ok(outcome @ ClearOutcome::Missing) => {
            render(StatusCode::OK, page(&state, choice, "").await.with_info(outcome.message()))
        }
        Err(err) => {
            error!(error = %err, "failed to clear prediction log");
            render(
                StatusCode::INTERNAL_SERVER_ERROR,
                page(&state, choice, "").await.with_error(format!("{err:#}")),
            )
        }
    }
}

async fn download(State(state): State<AppState>) -> Response {
    csv_download(state.analyzer.log()).await
}

async fn page(state: &AppState, choice: ModelChoice, text: &str) -> PageView {
    let log = state.analyzer.log();
    let summary = log.summary_async().await;
    PageView::new(choice, text, &summary, log.file_name())
}

fn render(status: StatusCode, view: PageView) -> Response {
    match view.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(error = %err, "page rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("page rendering failed: {err}")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyzer::tests::{promotion_scores, stub_analyzer},
        api::app,
        inference::registry::tests::StubLoader,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app(dir: &tempfile::TempDir, loader: StubLoader) -> Router {
        let analyzer = stub_analyzer(dir, Arc::new(loader));
        app(AppState::new(Arc::new(analyzer)))
    }

    async fn post_form(app: &Router, uri: &str, form: &str) -> (StatusCode, String) {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get_page(app: &Router, uri: &str) -> (StatusCode, String) {
        let res = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_shows_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir, StubLoader::new(promotion_scores()));

        let (status, html) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Text → Emotion Analyzer 🎯"));
        assert!(html.contains("No predictions saved yet."));
        assert!(html.contains("I got a promotion today!"));
    }

    #[tokio::test]
    async fn predict_form_renders_result_and_updates_count() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir, StubLoader::new(promotion_scores()));

        let (status, html) = post_form(
            &app,
            "/predict",
            "text=I+got+a+promotion+today%21&language=English+%28fast%29",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Predicted emotion: <strong>joy</strong>"));
        assert!(html.contains("Saved to log ✅"));
        assert!(html.contains("Total saved predictions: <strong>1</strong>"));
    }

    #[tokio::test]
    async fn blank_form_warns() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir, StubLoader::new(promotion_scores()));

        let (status, html) = post_form(&app, "/predict", "text=++&language=English+%28fast%29").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(EMPTY_INPUT_WARNING));
        assert!(html.contains("No predictions saved yet."));
    }

    #[tokio::test]
    async fn model_failure_shows_error_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir, StubLoader::failing_first(promotion_scores(), 1));

        let (status, html) = post_form(&app, "/predict", "text=hello&language=English+%28fast%29").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("Prediction failed:"));
        assert!(html.contains("network unreachable"));
    }

    #[tokio::test]
    async fn clear_reports_removed_then_missing() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir, StubLoader::new(promotion_scores()));
        post_form(&app, "/predict", "text=hello&language=English+%28fast%29").await;

        let (_, html) = post_form(&app, "/clear", "").await;
        assert!(html.contains(r#"<div class="box success">Log cleared.</div>"#));

        let (status, html) = post_form(&app, "/clear", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<div class="box info">No log file found.</div>"#));
        assert!(html.contains("No predictions saved yet."));
    }

    #[tokio::test]
    async fn clear_keeps_the_selected_model() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir, StubLoader::new(promotion_scores()));

        let (_, html) = get_page(&app, "/").await;
        assert!(html.contains(r#"<input type="hidden" name="language" value="English (fast)">"#));

        let (status, html) =
            post_form(&app, "/clear", "language=Hindi+%2F+Multilingual").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<option value="English (fast)">"#));
        assert!(!html.contains(r#"<option value="English (fast)" selected>"#));
        assert!(!html.contains(r#"name="language" value="English (fast)""#));
    }
}
