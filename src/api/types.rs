use serde::{Deserialize, Serialize};

use crate::{
    analyzer::EmotionReport,
    emotion::{label_to_emoji, LabelScore},
    inference::ModelChoice,
};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
    /// UI label of the model choice; defaults to English when omitted.
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreView {
    pub label: String,
    pub score: f32,
    pub emoji: &'static str,
}

impl From<&LabelScore> for ScoreView {
    fn from(s: &LabelScore) -> Self {
        Self {
            label: s.label.clone(),
            score: s.score,
            emoji: label_to_emoji(&s.label),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub language: &'static str,
    pub model_id: &'static str,
    pub emoji: &'static str,
    pub top: ScoreView,
    pub top3: Vec<ScoreView>,
    pub scores: Vec<ScoreView>,
    pub progress: u8,
}

impl From<&EmotionReport> for PredictResponse {
    fn from(report: &EmotionReport) -> Self {
        Self {
            language: report.choice().label(),
            model_id: report.model_id(),
            emoji: report.emoji(),
            top: report.top().into(),
            top3: report.top3().iter().map(ScoreView::from).collect(),
            scores: report.ranked().as_slice().iter().map(ScoreView::from).collect(),
            progress: report.progress(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WarningResponse {
    pub warning: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub choice: ModelChoice,
    pub label: &'static str,
    pub model_id: &'static str,
    pub loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct LogSummaryResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
    pub message: &'static str,
}
