//! Command-line and environment configuration for the ML service.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use medinsight_ml::ForestConfig;

#[derive(Debug, Parser)]
#[command(name = "medinsight-ml-service", version, about = "No-show prediction service")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "MEDINSIGHT_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Model artifact; trained and written here if absent.
    #[arg(long, env = "MEDINSIGHT_MODEL_PATH", default_value = "model.json")]
    pub model_path: PathBuf,

    /// Trees in a freshly trained forest.
    #[arg(long, env = "MEDINSIGHT_TREES", default_value_t = 100)]
    pub trees: usize,

    /// Seed for a freshly trained forest.
    #[arg(long, env = "MEDINSIGHT_SEED", default_value_t = 42)]
    pub seed: u64,
}

impl Config {
    /// Forest settings used only when no artifact exists yet.
    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.trees,
            seed: self.seed,
            ..Default::default()
        }
    }
}
