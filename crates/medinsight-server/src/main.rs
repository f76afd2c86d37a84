mod api;
mod config;
mod error;
mod extract;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use medinsight_ml::ModelService;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    info!("medinsight-ml-service v{}", env!("CARGO_PKG_VERSION"));

    let service = Arc::new(ModelService::with_config(
        &config.model_path,
        config.forest_config(),
    ));

    // Warm the model before accepting traffic; a missing or unwritable
    // artifact location is fatal here.
    service
        .ensure_loaded()
        .await
        .with_context(|| format!("loading model from {}", config.model_path.display()))?;

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(addr = %config.bind, "ML service listening");

    axum::serve(listener, api::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("ML service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
