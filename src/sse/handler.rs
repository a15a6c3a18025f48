//! SSE handler implementation.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{AppError, Result};
use crate::hub::{ConnectionId, FrameReceiver, NotificationHub, SseFrame};
use crate::metrics::ConnectionMetrics;
use crate::server::AppState;

/// Name of the first event on every stream
pub const CONNECTED_EVENT: &str = "connected";

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Payload of the `connected` event
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedPayload {
    pub connection_id: ConnectionId,
    pub recipient_id: String,
    pub connected_at: DateTime<Utc>,
}

/// Query parameters for SSE endpoint
#[derive(Debug, Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
}

/// Subscribe handler: authenticate, register with the hub, stream frames
#[tracing::instrument(
    name = "sse.subscribe",
    skip(state, query, headers),
    fields(has_query_token = query.token.is_some())
)]
pub async fn sse_handler(
    State(state): State<AppState>,
    Query(query): Query<SseQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let token = extract_token(&query, &headers)
        .ok_or_else(|| AppError::Auth("Missing authentication token".to_string()))?;

    let claims = state.jwt_validator.validate(&token).inspect_err(|e| {
        tracing::warn!(error = %e, "JWT validation failed");
    })?;

    let recipient_id = claims.sub;
    let (tx, rx) = mpsc::channel(state.settings.sse.channel_capacity.max(1));
    let connection_id = state.hub.register(recipient_id.clone(), tx);

    ConnectionMetrics::opened();

    tracing::info!(
        connection_id = %connection_id,
        recipient_id = %recipient_id,
        apartment_id = ?claims.apartment_id,
        roles = ?claims.roles,
        "SSE connection established"
    );

    let stream = create_sse_stream(rx, connection_id, recipient_id, state.hub.clone());

    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.settings.sse.keep_alive())
            .text("keep-alive"),
    );

    Ok((
        [
            (header::CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        sse,
    )
        .into_response())
}

/// Extract token from query parameter or Authorization header.
/// The query wins because browser `EventSource` cannot set headers.
fn extract_token(query: &SseQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(ref token) = query.token {
        if !token.is_empty() {
            return Some(token.clone());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

fn to_event(frame: &SseFrame) -> Event {
    Event::default().event(frame.event()).data(frame.data())
}

/// Create the SSE event stream
fn create_sse_stream(
    rx: FrameReceiver,
    connection_id: ConnectionId,
    recipient_id: String,
    hub: Arc<NotificationHub>,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    let connected = ConnectedPayload {
        connection_id,
        recipient_id: recipient_id.clone(),
        connected_at: Utc::now(),
    };

    // Dropped when the client goes away or the hub closes the channel
    let cleanup_guard = CleanupGuard {
        connection_id,
        recipient_id,
        hub,
        connection_start: Instant::now(),
    };

    async_stream::stream! {
        let _guard = cleanup_guard;

        match SseFrame::new(CONNECTED_EVENT, &connected) {
            Ok(frame) => {
                yield Ok(to_event(&frame));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode connected event");
            }
        }

        let mut frames = ReceiverStream::new(rx);
        while let Some(frame) = frames.next().await {
            yield Ok(to_event(&frame));
        }
    }
}

/// Unregisters the connection when the stream is dropped
struct CleanupGuard {
    connection_id: ConnectionId,
    recipient_id: String,
    hub: Arc<NotificationHub>,
    connection_start: Instant,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let lifetime = self.connection_start.elapsed();
        ConnectionMetrics::closed(lifetime);

        self.hub.unregister(&self.recipient_id, self.connection_id);

        tracing::info!(
            connection_id = %self.connection_id,
            recipient_id = %self.recipient_id,
            duration_secs = lifetime.as_secs_f64(),
            "SSE connection closed"
        );
    }
}
