use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::{
    emotion::{label_to_emoji, LabelScore, RankedScores},
    inference::{ModelChoice, ModelRegistry},
    storage::{LogRow, PredictionLog},
};

pub const EMPTY_INPUT_WARNING: &str = "Please enter a sentence to analyze.";

/// Everything the page and the API show for one prediction.
///
/// Only built from a non-empty ranking, so `top` always exists.
#[derive(Debug, Clone)]
pub struct EmotionReport {
    choice: ModelChoice,
    top: LabelScore,
    ranked: RankedScores,
}

impl EmotionReport {
    /// `None` when the model produced no scores.
    pub fn new(choice: ModelChoice, ranked: RankedScores) -> Option<Self> {
        let top = ranked.top()?.clone();
        Some(Self {
            choice,
            top,
            ranked,
        })
    }

    pub fn choice(&self) -> ModelChoice {
        self.choice
    }

    pub fn model_id(&self) -> &'static str {
        self.choice.model_id()
    }

    pub fn ranked(&self) -> &RankedScores {
        &self.ranked
    }

    pub fn top(&self) -> &LabelScore {
        &self.top
    }

    pub fn top3(&self) -> &[LabelScore] {
        self.ranked.top3()
    }

    pub fn emoji(&self) -> &'static str {
        label_to_emoji(&self.top.label)
    }

    /// Whole-percent progress for the top score, clamped to 0..=100.
    pub fn progress(&self) -> u8 {
        (self.top.score * 100.0).clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone)]
pub enum PredictOutcome {
    EmptyInput,
    Predicted(EmotionReport),
}

/// Selector → model → ranking → log, one call per button press.
pub struct EmotionAnalyzer {
    registry: Arc<ModelRegistry>,
    log: Arc<PredictionLog>,
}

impl EmotionAnalyzer {
    pub fn new(registry: Arc<ModelRegistry>, log: Arc<PredictionLog>) -> Self {
        Self { registry, log }
    }

    pub fn log(&self) -> &Arc<PredictionLog> {
        &self.log
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub async fn predict(&self, text: &str, choice: ModelChoice) -> Result<PredictOutcome> {
        if text.trim().is_empty() {
            return Ok(PredictOutcome::EmptyInput);
        }

        let model_id = choice.model_id();
        let model = self.registry.get(model_id).await?;

        let input = text.to_string();
        let scores = tokio::task::spawn_blocking(move || model.classify(&input))
            .await
            .context("inference task panicked")??;
        let Some(report) = EmotionReport::new(choice, RankedScores::rank(scores)) else {
            bail!("model {model_id} returned no scores");
        };

        let row = LogRow::new(text, choice.label(), report.ranked())?;
        self.log.append_async(row).await?;

        info!(
            model_id,
            language = choice.label(),
            chars = text.chars().count(),
            top_label = report.top().label.as_str(),
            top_score = report.top().score,
            "prediction saved"
        );

        Ok(PredictOutcome::Predicted(report))
    }

    /// Loads the model for `choice` ahead of the first request.
    pub async fn preload(&self, choice: ModelChoice) -> Result<()> {
        self.registry.get(choice.model_id()).await.map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        inference::{registry::tests::StubLoader, selector::MULTI_MODEL},
        storage::LogSummary,
    };
    use std::sync::atomic::Ordering;

    pub(crate) fn promotion_scores() -> Vec<LabelScore> {
        vec![
            LabelScore::new("sadness", 0.01),
            LabelScore::new("joy", 0.91),
            LabelScore::new("neutral", 0.02),
            LabelScore::new("anger", 0.01),
            LabelScore::new("surprise", 0.05),
        ]
    }

    pub(crate) fn stub_analyzer(
        dir: &tempfile::TempDir,
        loader: Arc<StubLoader>,
    ) -> EmotionAnalyzer {
        let registry = Arc::new(ModelRegistry::new(loader));
        let log = Arc::new(PredictionLog::new(dir.path().join("predictions_log.csv")));
        EmotionAnalyzer::new(registry, log)
    }

    #[tokio::test]
    async fn blank_input_warns_without_touching_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(StubLoader::new(promotion_scores()));
        let analyzer = stub_analyzer(&dir, loader.clone());

        for text in ["", "   ", "\n\t"] {
            let outcome = analyzer.predict(text, ModelChoice::English).await.unwrap();
            assert!(matches!(outcome, PredictOutcome::EmptyInput));
        }

        assert_eq!(analyzer.log().summary_async().await, LogSummary::Missing);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn promotion_sentence_is_joy_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = stub_analyzer(&dir, Arc::new(StubLoader::new(promotion_scores())));

        let outcome = analyzer
            .predict("I got a promotion today!", ModelChoice::English)
            .await
            .unwrap();
        let PredictOutcome::Predicted(report) = outcome else {
            panic!("expected a prediction");
        };

        assert_eq!(report.top().label, "joy");
        assert_eq!(report.emoji(), "😄");
        assert_eq!(report.progress(), 91);
        let top3: Vec<(&str, f32)> = report
            .top3()
            .iter()
            .map(|s| (s.label.as_str(), s.score))
            .collect();
        assert_eq!(top3, [("joy", 0.91), ("surprise", 0.05), ("neutral", 0.02)]);

        let rows = analyzer.log().read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].top_label, "joy");
        assert_eq!(rows[0].top_score, 0.91);
        assert_eq!(rows[0].language, "English (fast)");
        assert_eq!(rows[0].text, "I got a promotion today!");
        assert_eq!(rows[0].scores().unwrap(), report.ranked().as_slice());
    }

    #[tokio::test]
    async fn multilingual_choice_ignores_input_script() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = stub_analyzer(&dir, Arc::new(StubLoader::new(promotion_scores())));

        for text in ["मुझे आज बहुत खुश महसूस हो रहा है।", "plain English text"] {
            let outcome = analyzer
                .predict(text, ModelChoice::from_ui("Hindi / Multilingual"))
                .await
                .unwrap();
            let PredictOutcome::Predicted(report) = outcome else {
                panic!("expected a prediction");
            };
            assert_eq!(report.model_id(), MULTI_MODEL);
        }
        assert_eq!(analyzer.registry().loaded(), vec![MULTI_MODEL.to_string()]);
    }

    #[tokio::test]
    async fn load_failure_propagates_and_logs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(StubLoader::failing_first(promotion_scores(), 1));
        let analyzer = stub_analyzer(&dir, loader);

        let err = analyzer
            .predict("I am so worried about the results.", ModelChoice::English)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("network unreachable"));
        assert_eq!(analyzer.log().summary_async().await, LogSummary::Missing);

        // the failed load was not cached
        assert!(analyzer
            .predict("I am so worried about the results.", ModelChoice::English)
            .await
            .is_ok());
        assert_eq!(analyzer.log().summary_async().await, LogSummary::Rows(1));
    }

    #[tokio::test]
    async fn empty_model_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = stub_analyzer(&dir, Arc::new(StubLoader::new(Vec::new())));

        let err = analyzer
            .predict("anything", ModelChoice::English)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("returned no scores"));
    }

    #[tokio::test]
    async fn blank_input_leaves_existing_rows_alone() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = stub_analyzer(&dir, Arc::new(StubLoader::new(promotion_scores())));
        for text in ["I got a promotion today!", "You are disgusting."] {
            analyzer.predict(text, ModelChoice::English).await.unwrap();
        }
        let before = std::fs::read(analyzer.log().path()).unwrap();
        assert_eq!(analyzer.log().summary_async().await, LogSummary::Rows(2));

        let outcome = analyzer.predict("  \n ", ModelChoice::English).await.unwrap();
        assert!(matches!(outcome, PredictOutcome::EmptyInput));

        assert_eq!(analyzer.log().summary_async().await, LogSummary::Rows(2));
        assert_eq!(std::fs::read(analyzer.log().path()).unwrap(), before);
    }

    #[test]
    fn report_needs_a_top_score() {
        assert!(EmotionReport::new(ModelChoice::English, RankedScores::rank(Vec::new())).is_none());

        let report =
            EmotionReport::new(ModelChoice::Multilingual, RankedScores::rank(promotion_scores()))
                .unwrap();
        assert_eq!(report.top().label, "joy");
        assert_eq!(report.model_id(), MULTI_MODEL);
        assert_eq!(report.ranked().as_slice().len(), 5);
    }
}
