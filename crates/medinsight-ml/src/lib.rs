//! No-show model: a random forest trained on a fixed fallback dataset,
//! persisted as a JSON artifact and served through [`ModelService`].

pub mod artifact;
pub mod dataset;
mod error;
pub mod forest;
mod model;
mod service;
pub mod tree;

pub use dataset::Dataset;
pub use error::ModelError;
pub use forest::{ForestConfig, RandomForestClassifier};
pub use model::{ArtifactHeader, NO_SHOW_CLASS, NoShowModel};
pub use service::ModelService;
