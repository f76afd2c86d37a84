//! The persisted no-show model: a forest plus the header describing it.

use chrono::{DateTime, Utc};
use medinsight_core::{FEATURE_NAMES, FeatureVector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ModelError;
use crate::dataset::Dataset;
use crate::forest::{ForestConfig, RandomForestClassifier};

/// Class index of "did not show up".
pub const NO_SHOW_CLASS: usize = 1;

/// Metadata stored ahead of the forest in the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub n_trees: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoShowModel {
    pub header: ArtifactHeader,
    forest: RandomForestClassifier,
}

impl NoShowModel {
    pub const FORMAT_VERSION: u32 = 1;

    /// Wrap an already fitted forest.
    pub fn from_forest(forest: RandomForestClassifier, feature_names: Vec<String>) -> Self {
        let header = ArtifactHeader {
            format_version: Self::FORMAT_VERSION,
            feature_names,
            trained_at: Utc::now(),
            n_trees: forest.n_trees(),
        };
        Self { header, forest }
    }

    /// Fit a forest on `dataset`.
    pub fn train(dataset: &Dataset, config: ForestConfig) -> Result<Self, ModelError> {
        let mut forest = RandomForestClassifier::new(config);
        forest.fit(dataset)?;
        info!(
            samples = dataset.n_samples(),
            trees = forest.n_trees(),
            seed = forest.config().seed,
            "trained no-show model"
        );
        Ok(Self::from_forest(forest, dataset.feature_names.clone()))
    }

    /// Fit the fallback model on the built-in ten-row dataset.
    pub fn train_fallback(config: ForestConfig) -> Result<Self, ModelError> {
        Self::train(&Dataset::no_show_training_set(), config)
    }

    /// Probability in `[0, 1]` that the appointment is missed.
    pub fn no_show_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.forest
            .predict_class_proba(&features.to_row(), NO_SHOW_CLASS)
    }

    pub fn forest(&self) -> &RandomForestClassifier {
        &self.forest
    }

    /// Whether the artifact was trained on the columns [`FeatureVector`] produces.
    pub fn matches_feature_vector(&self) -> bool {
        self.header.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES)
    }
}
