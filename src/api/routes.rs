use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::server::middleware::api_key_auth;
use crate::server::AppState;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::trigger::{broadcast_notification, complaint_status_changed, send_notification};

/// Largest trigger request body accepted
const MAX_TRIGGER_BODY_BYTES: usize = 64 * 1024;

pub fn api_routes(state: AppState) -> Router<AppState> {
    // Service-to-service emission endpoints
    let triggers = Router::new()
        .route("/api/v1/notifications/send", post(send_notification))
        .route("/api/v1/notifications/broadcast", post(broadcast_notification))
        .route("/api/v1/complaints/status", post(complaint_status_changed))
        .route_layer(middleware::from_fn_with_state(state, api_key_auth))
        .layer(RequestBodyLimitLayer::new(MAX_TRIGGER_BODY_BYTES));

    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .merge(triggers)
}
