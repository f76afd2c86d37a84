pub mod features;
pub mod prediction;
pub mod risk;

pub use features::{FEATURE_NAMES, FeatureVector};
pub use prediction::{PredictionRequest, PredictionResponse};
pub use risk::RiskLevel;
