//! DPR Risk Classifier - Main Entry Point
//!
//! Loads the exported model once and serves risk predictions over HTTP.

use anyhow::{Context, Result};
use dpr_risk_classifier::{
    config::AppConfig,
    metrics::{MetricsReporter, PredictionMetrics},
    models::inference::{OnnxRiskModel, RiskModel},
    pipeline::Predictor,
    server::{router, AppState},
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config)?;

    info!("Starting DPR Risk Classifier");
    info!(
        zero_division = ?config.features.zero_division,
        max_batch_size = config.server.max_batch_size,
        "Configuration loaded successfully"
    );

    // Model is loaded once and shared read-only by every request
    let model = OnnxRiskModel::load(
        Path::new(&config.models.model_path),
        config.models.schema_path.as_deref().map(Path::new),
        config.models.onnx_threads,
    )?;
    info!(
        model = %model.name(),
        columns = model.schema().len(),
        "Model ready"
    );

    let model: Arc<dyn RiskModel> = Arc::new(model);
    let predictor = Predictor::new(model, config.features.zero_division);
    let metrics = Arc::new(PredictionMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState {
        predictor,
        metrics: metrics.clone(),
        max_batch_size: config.server.max_batch_size,
    };
    let app = router(state, &config.server.cors_origins);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Listening for prediction requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Classifier shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(
        format!("dpr_risk_classifier={}", config.logging.level)
            .parse()
            .context("Invalid logging level")?,
    );

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
