pub mod device;
pub mod distilbert;
pub mod head;
pub mod hub;
pub mod loader;
pub mod registry;
pub mod selector;
pub mod xlm_roberta;

use std::sync::Arc;

use anyhow::Result;

use crate::emotion::LabelScore;

pub use loader::CandleModelLoader;
pub use registry::ModelRegistry;
pub use selector::ModelChoice;

/// A loaded text-classification model that scores every label it knows.
pub trait EmotionClassifier: Send + Sync {
    fn model_id(&self) -> &str;

    fn labels(&self) -> &[String];

    /// Returns one score per label, in the head's label order.
    fn classify(&self, text: &str) -> Result<Vec<LabelScore>>;
}

/// Builds classifiers by model identifier. Loading is blocking work.
pub trait ModelLoader: Send + Sync {
    fn load(&self, model_id: &str) -> Result<Arc<dyn EmotionClassifier>>;
}
