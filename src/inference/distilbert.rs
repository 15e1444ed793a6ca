use std::fs;

use anyhow::{Context, Result};
use candle::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::Linear;
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use tokenizers::Tokenizer;
use tracing::debug;

use super::{
    head::{self, HeadConfig, ScoreActivation},
    hub::{self, ModelSnapshot},
    EmotionClassifier,
};
use crate::emotion::LabelScore;

/// `DistilBertForSequenceClassification`: encoder, `pre_classifier` + ReLU,
/// then `classifier`, read off the first token.
pub struct DistilBertEmotionClassifier {
    model_id: String,
    model: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    labels: Vec<String>,
    activation: ScoreActivation,
}

impl DistilBertEmotionClassifier {
    pub fn load(
        model_id: &str,
        snapshot: &ModelSnapshot,
        head_cfg: &HeadConfig,
        device: Device,
        seq_cap: Option<usize>,
    ) -> Result<Self> {
        let raw = fs::read(&snapshot.config)
            .with_context(|| format!("failed to read {}", snapshot.config.display()))?;
        let config: DistilBertConfig = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", snapshot.config.display()))?;

        let labels = head_cfg.labels()?;
        let hidden = head_cfg.hidden_size()?;
        let max_len = head_cfg.max_seq_len(seq_cap);
        let tokenizer = head::load_tokenizer(&snapshot.tokenizer, max_len)?;

        let vb = hub::build_var_builder(&snapshot.weights, DType::F32, &device)?;
        let model = DistilBertModel::load(vb.pp("distilbert"), &config)
            .with_context(|| format!("failed to load DistilBERT encoder for {model_id}"))?;
        let pre_classifier = candle_nn::linear(hidden, hidden, vb.pp("pre_classifier"))?;
        let classifier = candle_nn::linear(hidden, labels.len(), vb.pp("classifier"))?;

        debug!(model_id, labels = ?labels, max_len, "distilbert head loaded");

        Ok(Self {
            model_id: model_id.to_string(),
            model,
            pre_classifier,
            classifier,
            tokenizer,
            device,
            labels,
            activation: head_cfg.activation(),
        })
    }

    fn logits(&self, ids: &[u32]) -> candle::Result<Tensor> {
        let input = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        // candle's DistilBERT masks positions where the mask is non-zero;
        // a single unpadded sequence attends everywhere.
        let mask = Tensor::zeros((1, ids.len()), DType::U8, &self.device)?;

        let hidden = self.model.forward(&input, &mask)?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pre_classifier.forward(&cls)?.relu()?;
        self.classifier.forward(&pooled)
    }
}

impl EmotionClassifier for DistilBertEmotionClassifier {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        let ids = head::encode_ids(&self.tokenizer, text)?;
        let logits = self
            .logits(&ids)
            .context("distilbert forward pass failed")?;
        head::scores_from_logits(&logits, &self.labels, self.activation)
    }
}
