//! Process-wide owner of the loaded no-show model.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use medinsight_core::FeatureVector;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::forest::ForestConfig;
use crate::model::NoShowModel;
use crate::{ModelError, artifact};

/// Holds the single model instance for the process.
///
/// The model is loaded (or trained and persisted) on the first call to
/// [`ensure_loaded`](Self::ensure_loaded) or [`score`](Self::score).
/// Concurrent first callers wait on the same initialization; a failed
/// initialization leaves the service unloaded so the next call retries.
pub struct ModelService {
    model_path: PathBuf,
    config: ForestConfig,
    model: OnceCell<Arc<NoShowModel>>,
}

impl ModelService {
    /// Service backed by the artifact at `model_path`, training with the
    /// default forest settings if it is absent.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self::with_config(model_path, ForestConfig::default())
    }

    pub fn with_config(model_path: impl Into<PathBuf>, config: ForestConfig) -> Self {
        Self {
            model_path: model_path.into(),
            config,
            model: OnceCell::new(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Load the artifact, or train and write the fallback model if there is
    /// none. Returns the held model without touching disk once loaded.
    pub async fn ensure_loaded(&self) -> Result<Arc<NoShowModel>, ModelError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let path = self.model_path.clone();
                let config = self.config.clone();
                let model =
                    tokio::task::spawn_blocking(move || load_or_train(&path, config)).await??;
                Ok::<_, ModelError>(Arc::new(model))
            })
            .await?;
        Ok(Arc::clone(model))
    }

    /// No-show probability for `features`, loading the model first if needed.
    pub async fn score(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let model = self.ensure_loaded().await?;
        model.no_show_probability(features)
    }
}

fn load_or_train(path: &Path, config: ForestConfig) -> Result<NoShowModel, ModelError> {
    if path.exists() {
        let model = artifact::read(path)?;
        if !model.matches_feature_vector() {
            warn!(
                path = %path.display(),
                features = ?model.header.feature_names,
                "model artifact was trained on different features"
            );
        }
        return Ok(model);
    }

    info!(path = %path.display(), "no model artifact found, training fallback model");
    let model = NoShowModel::train_fallback(config)?;
    artifact::write(path, &model)?;
    Ok(model)
}
