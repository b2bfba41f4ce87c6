//! Price Signal Server - Main Entry Point
//!
//! Loads the model artifact, then serves `POST /predict` until Ctrl-C.

use anyhow::{Context, Result};
use price_signal_server::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServingMetrics},
    server, ModelLoader, PredictionService,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Price Signal Server");
    info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.model.path,
        "Configuration loaded"
    );

    // Model load failures are fatal: nothing is served without a model
    let loader =
        ModelLoader::with_threads(config.model.onnx_threads, &config.model.feature_names_key);
    let artifact = loader
        .load(&config.model.path)
        .context("Failed to load model artifact")?;
    info!(
        model = %artifact.classifier.name(),
        features = ?artifact.feature_names,
        "Model artifact ready ({} features)",
        artifact.feature_count()
    );

    let metrics = Arc::new(ServingMetrics::new());
    let service = Arc::new(PredictionService::new(artifact, metrics.clone()));

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let addr = config.server.bind_addr()?;
    server::serve(addr, service.clone(), shutdown_signal()).await?;

    info!(
        logged = service.log().len(),
        "Server shutting down..."
    );
    metrics.print_summary();

    Ok(())
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("price_signal_server={}", config.level)))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
