pub mod emoji;
pub mod rank;

use serde::{Deserialize, Serialize};

pub use emoji::label_to_emoji;
pub use rank::RankedScores;

/// One class emitted by a classification head together with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}
