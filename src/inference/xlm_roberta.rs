use std::fs;

use anyhow::{Context, Result};
use candle::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::Linear;
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::debug;

use super::{
    head::{self, HeadConfig, ScoreActivation},
    hub::{self, ModelSnapshot},
    EmotionClassifier,
};
use crate::emotion::LabelScore;

/// `XLMRobertaForSequenceClassification`: encoder, then `classifier.dense`
/// + tanh and `classifier.out_proj` on the `<s>` token.
pub struct XlmRobertaEmotionClassifier {
    model_id: String,
    roberta: XLMRobertaModel,
    dense: Linear,
    out_proj: Linear,
    tokenizer: Tokenizer,
    device: Device,
    labels: Vec<String>,
    activation: ScoreActivation,
}

impl XlmRobertaEmotionClassifier {
    pub fn load(
        model_id: &str,
        snapshot: &ModelSnapshot,
        head_cfg: &HeadConfig,
        device: Device,
        seq_cap: Option<usize>,
    ) -> Result<Self> {
        let raw = fs::read(&snapshot.config)
            .with_context(|| format!("failed to read {}", snapshot.config.display()))?;
        let config: Config = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", snapshot.config.display()))?;

        let labels = head_cfg.labels()?;
        let hidden = head_cfg.hidden_size()?;
        let max_len = head_cfg.max_seq_len(seq_cap);
        let tokenizer = head::load_tokenizer(&snapshot.tokenizer, max_len)?;

        let vb = hub::build_var_builder(&snapshot.weights, DType::F32, &device)?;
        let roberta = XLMRobertaModel::new(&config, vb.pp("roberta"))
            .with_context(|| format!("failed to load XLM-R encoder for {model_id}"))?;
        let dense = candle_nn::linear(hidden, hidden, vb.pp("classifier.dense"))?;
        let out_proj = candle_nn::linear(hidden, labels.len(), vb.pp("classifier.out_proj"))?;

        debug!(model_id, labels = ?labels, max_len, "xlm-roberta head loaded");

        Ok(Self {
            model_id: model_id.to_string(),
            roberta,
            dense,
            out_proj,
            tokenizer,
            device,
            labels,
            activation: head_cfg.activation(),
        })
    }

    fn logits(&self, ids: &[u32]) -> candle::Result<Tensor> {
        let seq_len = ids.len();
        let input = Tensor::new(ids, &self.device)?.reshape((1, seq_len))?;
        let mask = Tensor::ones((1, seq_len), DType::U32, &self.device)?;
        let token_type_ids = Tensor::zeros((1, seq_len), DType::U32, &self.device)?;

        let hidden = self
            .roberta
            .forward(&input, &mask, &token_type_ids, None, None, None)?;
        let cls = hidden.i((.., 0))?;
        let x = self.dense.forward(&cls)?.tanh()?;
        self.out_proj.forward(&x)
    }
}

impl EmotionClassifier for XlmRobertaEmotionClassifier {
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
            .context("xlm-roberta forward pass failed")?;
        head::scores_from_logits(&logits, &self.labels, self.activation)
    }
}
