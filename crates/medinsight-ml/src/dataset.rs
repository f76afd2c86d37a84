//! In-memory labelled samples for training.

use medinsight_core::FEATURE_NAMES;
use rand::Rng;

/// Row-major feature matrix with one class label per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            features: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Append one labelled row. Rows should hold one value per feature
    /// name; `RandomForestClassifier::fit` rejects ragged data.
    pub fn add_sample(&mut self, row: Vec<f64>, label: usize) {
        self.features.push(row);
        self.labels.push(label);
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of classes, assuming labels are dense from zero. Never less than two.
    pub fn n_classes(&self) -> usize {
        self.labels.iter().max().map_or(2, |&max| (max + 1).max(2))
    }

    /// Draw `n_samples` row indices with replacement.
    pub fn bootstrap_indices<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let n = self.n_samples();
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }

    /// The ten hand-labelled appointments the fallback model is trained on.
    ///
    /// Columns: age, distance (km), lead time (days), previous no-shows.
    /// Label `1` means the patient did not show up.
    pub fn no_show_training_set() -> Self {
        const ROWS: [([f64; 4], usize); 10] = [
            ([25.0, 5.0, 2.0, 0.0], 0),
            ([30.0, 10.0, 15.0, 1.0], 1),
            ([45.0, 2.0, 1.0, 0.0], 0),
            ([60.0, 15.0, 30.0, 2.0], 1),
            ([22.0, 20.0, 5.0, 1.0], 1),
            ([35.0, 3.0, 3.0, 0.0], 0),
            ([50.0, 8.0, 20.0, 1.0], 1),
            ([65.0, 12.0, 25.0, 0.0], 0),
            ([20.0, 1.0, 1.0, 0.0], 0),
            ([40.0, 7.0, 10.0, 0.0], 0),
        ];

        let mut dataset = Self::new(FEATURE_NAMES.iter().map(|s| s.to_string()).collect());
        for (row, label) in ROWS {
            dataset.add_sample(row.to_vec(), label);
        }
        dataset
    }
}
