//! CART classification tree with Gini impurity.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Minimum impurity decrease for a split to be taken.
const MIN_GAIN: f64 = 1e-12;

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth (None grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child of a split
    pub min_samples_leaf: usize,
    /// Features drawn per split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Tree node. Rows with `row[feature] <= threshold` go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        class_probs: Vec<f64>,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A single fitted classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    n_classes: usize,
    root: Option<Node>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            n_classes: 2,
            root: None,
        }
    }

    /// Fit on every row of `dataset`.
    pub fn fit<R: Rng>(&mut self, dataset: &Dataset, rng: &mut R) {
        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        self.fit_indices(dataset, &indices, rng);
    }

    /// Fit on the given rows. Repeated indices weight a row more heavily,
    /// which is how bootstrap samples are fed in.
    pub fn fit_indices<R: Rng>(&mut self, dataset: &Dataset, indices: &[usize], rng: &mut R) {
        self.n_classes = dataset.n_classes();
        self.root = if indices.is_empty() {
            None
        } else {
            Some(self.build(dataset, indices, 0, rng))
        };
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Class distribution of the leaf `row` lands in.
    ///
    /// Returns `None` for an unfitted tree or a row too short for a split
    /// it reaches.
    pub fn predict_proba(&self, row: &[f64]) -> Option<&[f64]> {
        let mut node = self.root.as_ref()?;
        loop {
            match node {
                Node::Leaf { class_probs, .. } => return Some(class_probs),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if *row.get(*feature)? <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    fn build<R: Rng>(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        depth: usize,
        rng: &mut R,
    ) -> Node {
        let counts = class_counts(dataset, indices, self.n_classes);
        let n = indices.len();

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if depth_reached || pure || n < self.config.min_samples_split {
            return leaf(&counts, n);
        }

        let Some(split) = self.best_split(dataset, indices, &counts, rng) else {
            return leaf(&counts, n);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| dataset.features[i][split.feature] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(dataset, &left_idx, depth + 1, rng)),
            right: Box::new(self.build(dataset, &right_idx, depth + 1, rng)),
        }
    }

    /// Best Gini split over a random subset of features.
    ///
    /// Draws features in random order and stops after `max_features` once a
    /// usable split has been found; if none of the drawn features can split
    /// the node, the remaining features are tried too.
    fn best_split<R: Rng>(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        parent_counts: &[usize],
        rng: &mut R,
    ) -> Option<Split> {
        let n_features = dataset.n_features();
        let max_features = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features.max(1));

        let mut feature_order: Vec<usize> = (0..n_features).collect();
        feature_order.shuffle(rng);

        let n = indices.len();
        let parent_gini = gini(parent_counts, n);
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<Split> = None;

        for (visited, &feature) in feature_order.iter().enumerate() {
            if visited >= max_features && best.is_some() {
                break;
            }

            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                dataset.features[a][feature].total_cmp(&dataset.features[b][feature])
            });

            // Sweep thresholds left to right, moving one row at a time.
            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.to_vec();
            for pos in 1..n {
                let moved = sorted[pos - 1];
                left[dataset.labels[moved]] += 1;
                right[dataset.labels[moved]] -= 1;

                let lo = dataset.features[moved][feature];
                let hi = dataset.features[sorted[pos]][feature];
                if lo >= hi || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }

                let weighted =
                    (pos as f64 * gini(&left, pos) + (n - pos) as f64 * gini(&right, n - pos))
                        / n as f64;
                let gain = parent_gini - weighted;
                if gain > best.as_ref().map_or(MIN_GAIN, |b| b.gain) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn class_counts(dataset: &Dataset, indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[dataset.labels[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize], n: usize) -> Node {
    let class_probs = counts.iter().map(|&c| c as f64 / n as f64).collect();
    Node::Leaf {
        class_probs,
        n_samples: n,
    }
}
