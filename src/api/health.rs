use axum::{extract::State, Json};
use serde::Serialize;

use crate::hub::HubStats;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: ConnectionStats,
    pub notifications: NotificationStats,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub unique_recipients: usize,
}

#[derive(Debug, Serialize)]
pub struct NotificationStats {
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
}

impl From<HubStats> for StatsResponse {
    fn from(stats: HubStats) -> Self {
        Self {
            connections: ConnectionStats {
                total_connections: stats.total_connections,
                unique_recipients: stats.unique_recipients,
            },
            notifications: NotificationStats {
                total_sent: stats.events_sent,
                total_delivered: stats.total_delivered,
                total_failed: stats.total_failed,
            },
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.hub.stats().into())
}
