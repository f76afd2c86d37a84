//! Risk tiers derived from a no-show probability.

use serde::{Deserialize, Serialize};

/// Probabilities strictly above this are [`RiskLevel::High`].
pub const HIGH_THRESHOLD: f64 = 0.7;
/// Probabilities strictly above this (and not high) are [`RiskLevel::Medium`].
pub const MEDIUM_THRESHOLD: f64 = 0.3;

/// Ordered risk bucket for a predicted no-show probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a probability: `p <= 0.3` is low, `p <= 0.7` is medium,
    /// anything above is high.
    pub fn from_probability(p: f64) -> Self {
        if p > HIGH_THRESHOLD {
            Self::High
        } else if p > MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
