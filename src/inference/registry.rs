use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Context, Result};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{EmotionClassifier, ModelLoader};

type Slot = Arc<OnceCell<Arc<dyn EmotionClassifier>>>;

/// Process-wide model cache keyed by model identifier.
///
/// Entries are filled on first use and never evicted. Concurrent first
/// requests for one key wait on the same load. A failed load leaves the slot
/// empty, so the next request tries again.
pub struct ModelRegistry {
    loader: Arc<dyn ModelLoader>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ModelRegistry {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, model_id: &str) -> Result<Arc<dyn EmotionClassifier>> {
        let slot = self.slot(model_id)?;

        let model = slot
            .get_or_try_init(|| async {
                info!(model_id, "loading emotion model");
                let loader = Arc::clone(&self.loader);
                let id = model_id.to_string();
                let loaded = tokio::task::spawn_blocking(move || loader.load(&id))
                    .await
                    .context("model loader task panicked")?;

                match &loaded {
                    Ok(model) => info!(
                        model_id = model.model_id(),
                        labels = model.labels().len(),
                        "emotion model ready"
                    ),
                    Err(err) => warn!(model_id, error = %err, "emotion model load failed"),
                }
                loaded
            })
            .await?;

        Ok(Arc::clone(model))
    }

    /// Identifiers whose model is currently resident.
    pub fn loaded(&self) -> Vec<String> {
        let Ok(slots) = self.slots.lock() else {
            return Vec::new();
        };
        let mut ids: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn slot(&self, model_id: &str) -> Result<Slot> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("model registry lock poisoned"))?;
        Ok(Arc::clone(slots.entry(model_id.to_string()).or_default()))
    }
}
