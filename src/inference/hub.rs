use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use candle::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::{Api, ApiRepo};
use tracing::{debug, info, warn};

const WEIGHT_CANDIDATES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// Files needed to build a classifier from one checkpoint.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// Local snapshot directory name for a hub id: `owner/name` → `owner__name`.
pub fn local_dir_name(model_id: &str) -> String {
    model_id.replace('/', "__")
}

/// Looks in `models_dir` first, then downloads through the hub cache.
pub fn resolve_snapshot(models_dir: Option<&Path>, model_id: &str) -> Result<ModelSnapshot> {
    if let Some(dir) = models_dir {
        let local = dir.join(local_dir_name(model_id));
        if local.join("config.json").exists() {
            info!(model_id, path = %local.display(), "using local model snapshot");
            return local_snapshot(&local);
        }
        debug!(model_id, path = %local.display(), "no local snapshot, falling back to hub");
    }
    hub_snapshot(model_id)
}

pub fn local_snapshot(dir: &Path) -> Result<ModelSnapshot> {
    let config = dir.join("config.json");
    let tokenizer = dir.join("tokenizer.json");
    if !tokenizer.exists() {
        return Err(anyhow!("tokenizer.json not found under {}", dir.display()));
    }
    let weights = find_model_weights(dir)
        .ok_or_else(|| anyhow!("no model weights found under {}", dir.display()))?;

    Ok(ModelSnapshot {
        config,
        tokenizer,
        weights,
    })
}

fn hub_snapshot(model_id: &str) -> Result<ModelSnapshot> {
    info!(model_id, "fetching model files from the hub");
    let api = Api::new().map_err(|e| anyhow!("Failed to initialize HuggingFace API: {e}"))?;
    let repo = api.model(model_id.to_string());

    let config = repo
        .get("config.json")
        .with_context(|| format!("failed to download config.json for {model_id}"))?;

    let weights = WEIGHT_CANDIDATES
        .iter()
        .find_map(|name| repo.get(name).ok())
        .ok_or_else(|| {
            anyhow!("no model weights found for {model_id} (tried {WEIGHT_CANDIDATES:?})")
        })?;

    let tokenizer = match repo.get("tokenizer.json") {
        Ok(path) => path,
        Err(err) => {
            let base = base_tokenizer_repo(&config)?;
            warn!(model_id, base, error = %err, "no tokenizer.json, using base checkpoint tokenizer");
            fetch_file(&api.model(base.to_string()), "tokenizer.json", base)?
        }
    };

    Ok(ModelSnapshot {
        config,
        tokenizer,
        weights,
    })
}

fn fetch_file(repo: &ApiRepo, name: &str, model_id: &str) -> Result<PathBuf> {
    repo.get(name)
        .with_context(|| format!("failed to download {name} for {model_id}"))
}

/// Fine-tuned checkpoints share the vocabulary of the base they were trained from.
fn base_tokenizer_repo(config: &Path) -> Result<&'static str> {
    let head = super::head::HeadConfig::from_path(config)?;
    match head.model_type.as_str() {
        "distilbert" => Ok("distilbert-base-uncased"),
        "xlm-roberta" => Ok("FacebookAI/xlm-roberta-base"),
        "roberta" => Ok("FacebookAI/roberta-base"),
        other => Err(anyhow!("no tokenizer fallback known for model_type '{other}'")),
    }
}

pub fn find_model_weights(snapshot: &Path) -> Option<PathBuf> {
    WEIGHT_CANDIDATES
        .iter()
        .map(|candidate| snapshot.join(candidate))
        .find(|path| path.exists())
}

pub fn build_var_builder(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "safetensors" {
        let files = vec![path.to_path_buf()];
        unsafe {
            VarBuilder::from_mmaped_safetensors(&files, dtype, device)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
        }
    } else {
        VarBuilder::from_pth(path, dtype, device)
            .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
    }
}
