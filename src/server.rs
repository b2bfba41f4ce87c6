//! HTTP surface: the `/predict` route

use crate::error::PredictError;
use crate::service::{PredictionResponse, PredictionService};
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::{Json, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Build the application router.
///
/// Request bodies are not size-capped, so every payload reaches the typed
/// parser and is answered with either a prediction or a JSON error.
pub fn router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::disable())
        .with_state(service)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, service: Arc<PredictionService>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Price signal server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;
    Ok(())
}

/// POST /predict
///
/// The body is taken as raw bytes so a malformed or non-JSON body still
/// reaches the typed parser instead of being rejected by an extractor.
async fn predict(
    State(service): State<Arc<PredictionService>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, PredictError> {
    service.predict(&body).map(Json)
}
