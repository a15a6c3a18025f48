//! Emission endpoints for sibling services.
//!
//! The CRUD services call these after committing a state change. Responses
//! carry the per-connection delivery report; an offline recipient is a
//! successful call with nothing delivered.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::hub::{validate_event_name, DeliveryReport};
use crate::notification::{ComplaintStatus, ComplaintStatusChanged};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub recipient_id: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastNotificationRequest {
    pub recipient_ids: Vec<String>,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
pub struct ComplaintStatusRequest {
    /// Resident who filed the complaint
    pub author_id: String,
    pub complaint_id: String,
    pub apartment_id: String,
    pub title: String,
    pub previous_status: ComplaintStatus,
    pub status: ComplaintStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    #[serde(flatten)]
    pub report: DeliveryReport,
    pub timestamp: DateTime<Utc>,
}

impl From<DeliveryReport> for DeliveryResponse {
    fn from(report: DeliveryReport) -> Self {
        Self {
            report,
            timestamp: Utc::now(),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Send an event to every connection of one recipient
#[tracing::instrument(
    name = "http.send_notification",
    skip(state, request),
    fields(recipient_id = %request.recipient_id, event = %request.event)
)]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<DeliveryResponse>> {
    require_non_empty("recipient_id", &request.recipient_id)?;
    validate_event_name(&request.event)?;

    let report = state
        .hub
        .notify(&request.recipient_id, &request.event, &request.payload)
        .await?;

    Ok(Json(report.into()))
}

/// Send an event to each recipient in order
#[tracing::instrument(
    name = "http.broadcast_notification",
    skip(state, request),
    fields(recipient_count = request.recipient_ids.len(), event = %request.event)
)]
pub async fn broadcast_notification(
    State(state): State<AppState>,
    Json(request): Json<BroadcastNotificationRequest>,
) -> Result<Json<DeliveryResponse>> {
    if request.recipient_ids.is_empty() {
        return Err(AppError::Validation(
            "recipient_ids must not be empty".to_string(),
        ));
    }
    validate_event_name(&request.event)?;

    let report = state
        .hub
        .broadcast(&request.recipient_ids, &request.event, &request.payload)
        .await?;

    Ok(Json(report.into()))
}

/// Push a committed complaint status change to its author
pub async fn complaint_status_changed(
    State(state): State<AppState>,
    Json(request): Json<ComplaintStatusRequest>,
) -> Result<Json<DeliveryResponse>> {
    require_non_empty("author_id", &request.author_id)?;
    require_non_empty("complaint_id", &request.complaint_id)?;

    let change = ComplaintStatusChanged {
        complaint_id: request.complaint_id,
        apartment_id: request.apartment_id,
        title: request.title,
        previous_status: request.previous_status,
        status: request.status,
        updated_at: request.updated_at.unwrap_or_else(Utc::now),
    };

    let report = state
        .complaints
        .status_changed(&request.author_id, &change)
        .await?;

    Ok(Json(report.into()))
}
