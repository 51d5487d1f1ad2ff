//! Heart Disease Prediction Service - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppState, ServiceConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use model_store::ArtifactStore;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    info!("=== Heart Disease Predictor v{} ===", env!("CARGO_PKG_VERSION"));

    let artifacts = match ArtifactStore::new(config.artifacts.clone()).load() {
        Ok(artifacts) => artifacts,
        Err(e) => {
            error!("Startup failure: {}", e);
            return Err(e).context("Failed to load model artifacts");
        }
    };

    let mut state = AppState::new(
        artifacts,
        config.encoding.category_policy,
        &config.artifacts.target_column,
    );
    if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
    }

    run_server(Arc::new(state), &config).await
}
