use serde::Serialize;

use super::LabelScore;

/// Model scores ordered best-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedScores {
    scores: Vec<LabelScore>,
}

impl RankedScores {
    /// Sorts by score descending. `sort_by` is stable, so equal scores keep
    /// the order the model emitted them in.
    pub fn rank(mut scores: Vec<LabelScore>) -> Self {
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self { scores }
    }

    pub fn top(&self) -> Option<&LabelScore> {
        self.scores.first()
    }

    pub fn top_k(&self, k: usize) -> &[LabelScore] {
        &self.scores[..k.min(self.scores.len())]
    }

    pub fn top3(&self) -> &[LabelScore] {
        self.top_k(3)
    }

    pub fn as_slice(&self) -> &[LabelScore] {
        &self.scores
    }
}
