use serde::Serialize;

/// Small, fast English checkpoint.
pub const EN_MODEL: &str = "bhadresh-savani/distilbert-base-uncased-emotion";
/// Multilingual checkpoint that covers Hindi among many others.
pub const MULTI_MODEL: &str = "cardiffnlp/twitter-xlm-roberta-base-emotion";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    #[default]
    English,
    Multilingual,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::English, ModelChoice::Multilingual];

    /// Anything that is not the English option lands on the multilingual model.
    pub fn from_ui(value: &str) -> Self {
        if value.starts_with("English") {
            ModelChoice::English
        } else {
            ModelChoice::Multilingual
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelChoice::English => "English (fast)",
            ModelChoice::Multilingual => "Hindi / Multilingual",
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            ModelChoice::English => EN_MODEL,
            ModelChoice::Multilingual => MULTI_MODEL,
        }
    }
}
