//! Prometheus metrics endpoint.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, Result};
use crate::metrics::{self, HubMetrics};
use crate::server::AppState;

/// GET /metrics - Prometheus metrics endpoint
pub async fn prometheus_metrics(State(state): State<AppState>) -> Result<Response> {
    // Gauges are refreshed at scrape time
    HubMetrics::set_gauges(&state.hub.stats());

    let output = metrics::encode_metrics()
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        output,
    )
        .into_response())
}
