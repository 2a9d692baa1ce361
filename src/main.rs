//! Big Mart Sales Predictor - Main Entry Point
//!
//! Loads the regression model once, then serves the prediction form and
//! JSON API over HTTP.

use anyhow::{Context, Result};
use bigmart_sales::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, PredictionMetrics},
    models::PredictorHandle,
    server::{self, page::FormPage, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Config path may be given as the first argument
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/config.toml".to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    init_logging(&config.logging)?;

    info!("Starting Big Mart Sales Predictor");
    info!(path = %config_path, "Configuration loaded successfully");

    // The model is loaded before the listener binds so a missing or
    // incompatible artifact stops the process here
    let handle = PredictorHandle::new(config.model.clone());
    let predictor = handle.get()?;
    info!(
        "Predictor initialized ({} features: {:?})",
        predictor.schema().feature_count(),
        predictor.schema().feature_names()
    );

    let metrics = Arc::new(PredictionMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState {
        predictor,
        metrics: metrics.clone(),
        display: Arc::new(config.display.clone()),
        page: Arc::new(FormPage::new().context("Failed to compile form template")?),
    };

    server::serve(&config.server.bind_addr(), state).await?;

    // Print final summary
    info!("Sales predictor shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!(
            "bigmart_sales={0},bigmart_sales_predictor={0}",
            logging.level
        )))?;

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
