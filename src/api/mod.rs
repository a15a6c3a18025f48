//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod routes;
mod trigger;

pub use health::{health, stats, HealthResponse, StatsResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use trigger::{
    broadcast_notification, complaint_status_changed, send_notification,
    BroadcastNotificationRequest, ComplaintStatusRequest, DeliveryResponse,
    SendNotificationRequest,
};
