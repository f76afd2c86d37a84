//! Random forest classifier with soft-vote probabilities.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::dataset::Dataset;
use crate::tree::{DecisionTree, TreeConfig};

/// Random forest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (None grows until pure)
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split (sqrt of total if None)
    pub max_features: Option<usize>,
    /// Fit each tree on a bootstrap sample
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            n_features: 0,
            n_classes: 2,
            trees: Vec::new(),
        }
    }

    /// Fit every tree. Trees are built in parallel, each from its own
    /// seed, so the result only depends on `config.seed`.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<(), ModelError> {
        if dataset.n_samples() == 0 || dataset.n_features() == 0 {
            return Err(ModelError::EmptyDataset);
        }

        let n_features = dataset.n_features();
        if let Some(row) = dataset.features.iter().find(|row| row.len() != n_features) {
            return Err(ModelError::FeatureMismatch {
                expected: n_features,
                got: row.len(),
            });
        }
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor().max(1.0) as usize);

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
        };
        let config = &self.config;

        self.trees = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let mut tree = DecisionTree::new(tree_config.clone());
                if config.bootstrap {
                    let sample = dataset.bootstrap_indices(&mut rng);
                    tree.fit_indices(dataset, &sample, &mut rng);
                } else {
                    tree.fit(dataset, &mut rng);
                }
                tree
            })
            .collect();

        self.n_features = n_features;
        self.n_classes = dataset.n_classes();
        Ok(())
    }

    /// Mean of the per-tree leaf class distributions for one row.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if row.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }

        // Every tree votes; one that cannot route the row fails the prediction.
        let mut sum = vec![0.0; self.n_classes];
        for (i, tree) in self.trees.iter().enumerate() {
            let probs = tree.predict_proba(row).ok_or(ModelError::InvalidTree(i))?;
            for (acc, &p) in sum.iter_mut().zip(probs) {
                *acc += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(sum
            .into_iter()
            .map(|s| (s / n_trees).clamp(0.0, 1.0))
            .collect())
    }

    /// Probability of `class` for one row.
    pub fn predict_class_proba(&self, row: &[f64], class: usize) -> Result<f64, ModelError> {
        self.predict_proba(row)?
            .get(class)
            .copied()
            .ok_or(ModelError::MissingClass(class))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fraction of rows whose most probable class matches the label.
    pub fn accuracy(&self, dataset: &Dataset) -> Result<f64, ModelError> {
        if dataset.n_samples() == 0 {
            return Err(ModelError::EmptyDataset);
        }
        let mut correct = 0usize;
        for (row, &label) in dataset.features.iter().zip(&dataset.labels) {
            let probs = self.predict_proba(row)?;
            let predicted = probs
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map_or(0, |(class, _)| class);
            if predicted == label {
                correct += 1;
            }
        }
        Ok(correct as f64 / dataset.n_samples() as f64)
    }
}
