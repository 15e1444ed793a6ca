use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use tracing::info;

use super::{
    device::build_device,
    distilbert::DistilBertEmotionClassifier,
    head::HeadConfig,
    hub::resolve_snapshot,
    xlm_roberta::XlmRobertaEmotionClassifier,
    EmotionClassifier, ModelLoader,
};
use crate::config::AppConfig;

/// Builds candle classifiers from hub or local snapshots, picking the
/// architecture from `model_type` in `config.json`.
pub struct CandleModelLoader {
    models_dir: Option<PathBuf>,
    device: String,
    seq_cap: Option<usize>,
}

impl CandleModelLoader {
    pub fn new(models_dir: Option<PathBuf>, device: impl Into<String>, seq_cap: Option<usize>) -> Self {
        Self {
            models_dir,
            device: device.into(),
            seq_cap,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.models_dir.clone(),
            config.device.clone(),
            config.max_seq_len,
        )
    }
}

impl ModelLoader for CandleModelLoader {
    fn load(&self, model_id: &str) -> Result<Arc<dyn EmotionClassifier>> {
        let snapshot = resolve_snapshot(self.models_dir.as_deref(), model_id)?;
        let head = HeadConfig::from_path(&snapshot.config)?;
        let device = build_device(&self.device)?;

        info!(
            model_id,
            model_type = head.model_type.as_str(),
            device = ?device,
            weights = %snapshot.weights.display(),
            "building classifier"
        );

        let model: Arc<dyn EmotionClassifier> = match head.model_type.as_str() {
            "distilbert" => Arc::new(DistilBertEmotionClassifier::load(
                model_id,
                &snapshot,
                &head,
                device,
                self.seq_cap,
            )?),
            "xlm-roberta" | "roberta" => Arc::new(XlmRobertaEmotionClassifier::load(
                model_id,
                &snapshot,
                &head,
                device,
                self.seq_cap,
            )?),
            other => bail!("unsupported model_type '{other}' for {model_id}"),
        };
        Ok(model)
    }
}
