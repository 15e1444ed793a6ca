use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use candle::{DType, Tensor};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};

use crate::emotion::LabelScore;

const DEFAULT_MAX_POSITIONS: usize = 512;

/// The parts of a checkpoint's `config.json` that describe the
/// classification head rather than the encoder.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadConfig {
    pub model_type: String,
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    problem_type: Option<String>,
    #[serde(default, alias = "dim")]
    hidden_size: Option<usize>,
    #[serde(default)]
    max_position_embeddings: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreActivation {
    Softmax,
    Sigmoid,
}

impl ScoreActivation {
    pub fn apply(self, logits: &Tensor) -> candle::Result<Tensor> {
        match self {
            ScoreActivation::Softmax => {
                let last_dim = logits.dims().len().saturating_sub(1);
                candle_nn::ops::softmax(logits, last_dim)
            }
            ScoreActivation::Sigmoid => candle_nn::ops::sigmoid(logits),
        }
    }
}

impl HeadConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Label names ordered by class index.
    pub fn labels(&self) -> Result<Vec<String>> {
        if self.id2label.is_empty() {
            bail!("config.json has no id2label mapping");
        }
        let mut indexed = self
            .id2label
            .iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|idx| (idx, label.clone()))
                    .map_err(|_| anyhow!("id2label key '{id}' is not a class index"))
            })
            .collect::<Result<Vec<_>>>()?;
        indexed.sort_by_key(|(idx, _)| *idx);

        for (expected, (idx, _)) in indexed.iter().enumerate() {
            if *idx != expected {
                bail!("id2label is missing class index {expected}");
            }
        }
        Ok(indexed.into_iter().map(|(_, label)| label).collect())
    }

    /// Independent per-class scores for multi-label and single-logit heads,
    /// a distribution over classes otherwise.
    pub fn activation(&self) -> ScoreActivation {
        let multi_label = self.problem_type.as_deref() == Some("multi_label_classification");
        if multi_label || self.id2label.len() == 1 {
            ScoreActivation::Sigmoid
        } else {
            ScoreActivation::Softmax
        }
    }

    pub fn hidden_size(&self) -> Result<usize> {
        self.hidden_size
            .ok_or_else(|| anyhow!("config.json has neither hidden_size nor dim"))
    }

    /// Longest token sequence the encoder accepts, optionally capped.
    pub fn max_seq_len(&self, cap: Option<usize>) -> usize {
        let positions = self.max_position_embeddings.unwrap_or(DEFAULT_MAX_POSITIONS);
        // RoBERTa-style position ids start after the padding index.
        let usable = if self.model_type.contains("roberta") {
            positions.saturating_sub(2)
        } else {
            positions
        };
        let usable = usable.max(16);
        cap.map(|cap| cap.clamp(16, usable)).unwrap_or(usable)
    }
}

/// Loads `tokenizer.json` with padding off and truncation at `max_len`.
pub fn load_tokenizer(path: &Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Tokenizer load failed ({}): {e}", path.display()))?;
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Tokenizer truncation config failed: {e}"))?;
    Ok(tokenizer)
}

pub fn encode_ids(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let enc = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow!("Tokenizer encode error: {e}"))?;
    let ids = enc.get_ids().to_vec();
    if ids.is_empty() {
        bail!("tokenizer produced no tokens");
    }
    Ok(ids)
}

/// Turns a `[1, num_labels]` logits tensor into labelled scores.
pub fn scores_from_logits(
    logits: &Tensor,
    labels: &[String],
    activation: ScoreActivation,
) -> Result<Vec<LabelScore>> {
    let probs = activation.apply(&logits.to_dtype(DType::F32)?)?;
    let values = probs
        .to_vec2::<f32>()
        .map_err(|e| anyhow!("failed to decode logits: {e}"))?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("logits tensor missing batch dimension"))?;

    if values.len() != labels.len() {
        bail!(
            "classification head produced {} scores for {} labels",
            values.len(),
            labels.len()
        );
    }

    Ok(labels
        .iter()
        .zip(values)
        .map(|(label, score)| LabelScore::new(label.clone(), score))
        .collect())
}
