use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported model artifact version {found} (expected {expected})")]
    UnsupportedArtifact { found: u32, expected: u32 },

    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    #[error("model has no fitted trees")]
    NotFitted,

    #[error("expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("tree {0} of the model cannot score this row")]
    InvalidTree(usize),

    #[error("model has no probability for class {0}")]
    MissingClass(usize),

    #[error("model task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
