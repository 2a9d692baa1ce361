//! HTTP presentation layer: the prediction form and a small JSON API

pub mod handlers;
pub mod page;

use crate::config::DisplayConfig;
use crate::metrics::PredictionMetrics;
use crate::models::inference::SalesPredictor;
use crate::server::page::FormPage;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::{error, info};

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<SalesPredictor>,
    pub metrics: Arc<PredictionMetrics>,
    pub display: Arc<DisplayConfig>,
    pub page: Arc<FormPage>,
}

/// Build the axum Router for the form and API endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .route("/api/predict", post(handlers::predict_json))
        .route("/api/predict/features", post(handlers::predict_features))
        .route("/api/schema", get(handlers::schema))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!(addr = %bind_addr, "Prediction form available at http://{}/", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
