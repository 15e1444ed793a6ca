use std::sync::OnceLock;

use minijinja::Environment;
use serde::Serialize;

use crate::{
    analyzer::EmotionReport,
    emotion::label_to_emoji,
    inference::ModelChoice,
    storage::LogSummary,
};

const PAGE_TEMPLATE_NAME: &str = "index.html";

const EXAMPLES: &[&str] = &[
    "I got a promotion today!",
    "I am so worried about the results.",
    "You are disgusting.",
    "मुझे आज बहुत खुश महसूस हो रहा है। (Hindi example)",
];

const NOTES: &[&str] = &[
    "English uses a small fast model. Hindi uses a multilingual model.",
    "First run downloads model weights (may take a minute).",
];

static TEMPLATES: OnceLock<Environment<'static>> = OnceLock::new();

fn templates() -> &'static Environment<'static> {
    TEMPLATES.get_or_init(|| {
        let mut env = Environment::new();
        if let Err(err) = env.add_template(
            PAGE_TEMPLATE_NAME,
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/index.html")),
        ) {
            tracing::error!(error = %err, "page template failed to compile");
        }
        env
    })
}

#[derive(Debug, Serialize)]
struct ChoiceView {
    value: &'static str,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct Flash {
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct LogPanel {
    state: &'static str,
    rows: String,
    error: String,
    file_name: String,
}

#[derive(Debug, Serialize)]
struct Top3Line {
    rank: usize,
    label: String,
    emoji: &'static str,
    score: String,
}

#[derive(Debug, Serialize)]
struct TableRow {
    emotion: String,
    confidence: String,
}

#[derive(Debug, Serialize)]
struct Bar {
    label: String,
    score: String,
    width: String,
}

#[derive(Debug, Serialize)]
struct ResultView {
    emoji: &'static str,
    label: String,
    confidence: String,
    progress: u8,
    top3: Vec<Top3Line>,
    table: Vec<TableRow>,
    chart: Vec<Bar>,
}

impl ResultView {
    fn from_report(report: &EmotionReport) -> Self {
        let top = report.top();
        let scores = report.ranked().as_slice();
        let max = scores
            .iter()
            .map(|s| s.score)
            .fold(0.0f32, f32::max);

        Self {
            emoji: report.emoji(),
            label: top.label.clone(),
            confidence: format!("{:.3}", top.score),
            progress: report.progress(),
            top3: report
                .top3()
                .iter()
                .enumerate()
                .map(|(i, s)| Top3Line {
                    rank: i + 1,
                    label: s.label.clone(),
                    emoji: label_to_emoji(&s.label),
                    score: format!("{:.3}", s.score),
                })
                .collect(),
            table: scores
                .iter()
                .map(|s| TableRow {
                    emotion: s.label.clone(),
                    confidence: round3(s.score),
                })
                .collect(),
            chart: scores
                .iter()
                .map(|s| Bar {
                    label: s.label.clone(),
                    score: format!("{:.3}", s.score),
                    width: if max > 0.0 {
                        format!("{:.1}", s.score / max * 100.0)
                    } else {
                        "0".to_string()
                    },
                })
                .collect(),
        }
    }
}

/// Everything the single page can show.
#[derive(Debug, Serialize)]
pub struct PageView {
    choices: Vec<ChoiceView>,
    language: &'static str,
    examples: &'static [&'static str],
    notes: &'static [&'static str],
    text: String,
    warning: Option<String>,
    error: Option<String>,
    flash: Option<Flash>,
    result: Option<ResultView>,
    log: LogPanel,
}

impl PageView {
    pub fn new(choice: ModelChoice, text: &str, summary: &LogSummary, file_name: String) -> Self {
        Self {
            choices: ModelChoice::ALL
                .iter()
                .map(|c| ChoiceView {
                    value: c.label(),
                    selected: *c == choice,
                })
                .collect(),
            language: choice.label(),
            examples: EXAMPLES,
            notes: NOTES,
            text: text.to_string(),
            warning: None,
            error: None,
            flash: None,
            result: None,
            log: log_panel(summary, file_name),
        }
    }

    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warning = Some(message.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn with_success(mut self, message: impl Into<String>) -> Self {
        self.flash = Some(Flash {
            kind: "success",
            message: message.into(),
        });
        self
    }

    pub fn with_info(mut self, message: impl Into<String>) -> Self {
        self.flash = Some(Flash {
            kind: "info",
            message: message.into(),
        });
        self
    }

    pub fn with_report(mut self, report: &EmotionReport) -> Self {
        self.result = Some(ResultView::from_report(report));
        self
    }

    pub fn render(&self) -> Result<String, minijinja::Error> {
        templates().get_template(PAGE_TEMPLATE_NAME)?.render(self)
    }
}

fn log_panel(summary: &LogSummary, file_name: String) -> LogPanel {
    let (state, rows, error) = match summary {
        LogSummary::Missing => ("missing", String::new(), String::new()),
        LogSummary::Rows(n) => ("rows", format_count(*n), String::new()),
        LogSummary::Unreadable(err) => ("error", String::new(), err.clone()),
    };
    LogPanel {
        state,
        rows,
        error,
        file_name,
    }
}

/// `1234567` → `1,234,567`.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Shortest decimal form after rounding to three places: `0.91`, `0.057`, `1`.
pub fn round3(value: f32) -> String {
    let rounded = (f64::from(value) * 1000.0).round() / 1000.0;
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{LabelScore, RankedScores};

    fn report() -> EmotionReport {
        EmotionReport::new(
            ModelChoice::English,
            RankedScores::rank(vec![
                LabelScore::new("surprise", 0.05),
                LabelScore::new("joy", 0.91),
                LabelScore::new("neutral", 0.02),
                LabelScore::new("sadness", 0.01),
                LabelScore::new("anger", 0.01),
            ]),
        )
        .unwrap()
    }

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn table_scores_round_to_three_places() {
        assert_eq!(round3(0.91), "0.91");
        assert_eq!(round3(0.05678), "0.057");
        assert_eq!(round3(1.0), "1");
    }

    #[test]
    fn result_page_shows_top_prediction() {
        let html = PageView::new(
            ModelChoice::English,
            "I got a promotion today!",
            &LogSummary::Rows(1234),
            "predictions_log.csv".into(),
        )
        .with_report(&report())
        .render()
        .unwrap();

        assert!(html.contains("😄  Predicted emotion: <strong>joy</strong>"));
        assert!(html.contains("Confidence: <strong>0.910</strong>"));
        assert!(html.contains("width: 91%"));
        assert!(html.contains("<strong>2. surprise</strong> 😲 — 0.050"));
        assert!(html.contains("<td>neutral</td><td>0.02</td>"));
        assert!(html.contains("Saved to log ✅"));
        assert!(html.contains("Total saved predictions: <strong>1,234</strong>"));
        assert!(html.contains(r#"<option value="English (fast)" selected>"#));
    }

    #[test]
    fn warning_and_log_states_render() {
        let html = PageView::new(
            ModelChoice::Multilingual,
            "",
            &LogSummary::Missing,
            "predictions_log.csv".into(),
        )
        .with_warning("Please enter a sentence to analyze.")
        .render()
        .unwrap();
        assert!(html.contains("Please enter a sentence to analyze."));
        assert!(html.contains("No predictions saved yet."));
        assert!(!html.contains("Predicted emotion"));
        assert!(!html.contains(r#"<option value="English (fast)" selected>"#));
        assert_eq!(html.matches(" selected>").count(), 1);

        let html = PageView::new(
            ModelChoice::English,
            "",
            &LogSummary::Unreadable("bad header".into()),
            "predictions_log.csv".into(),
        )
        .with_info("No log file found.")
        .render()
        .unwrap();
        assert!(html.contains("Could not load CSV log: bad header"));
        assert!(html.contains(r#"<div class="box info">No log file found.</div>"#));
    }

    #[test]
    fn user_text_is_escaped() {
        let html = PageView::new(
            ModelChoice::English,
            "<script>alert(1)</script>",
            &LogSummary::Missing,
            "predictions_log.csv".into(),
        )
        .render()
        .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
