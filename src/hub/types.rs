//! Connection handle and delivery bookkeeping types

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::SseFrame;

/// Sending half of a connection's outbound frame channel.
pub type FrameSender = mpsc::Sender<Arc<SseFrame>>;

/// Receiving half, owned by the transport that drives the stream.
pub type FrameReceiver = mpsc::Receiver<Arc<SseFrame>>;

/// Identity of one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Handle for a single push connection
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub recipient_id: String,
    pub connected_at: DateTime<Utc>,
    sender: FrameSender,
}

impl ConnectionHandle {
    pub fn new(recipient_id: String, sender: FrameSender) -> Self {
        Self {
            id: ConnectionId::new(),
            recipient_id,
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Queue a frame for the transport. Waits while the channel is full.
    pub async fn send(
        &self,
        frame: Arc<SseFrame>,
    ) -> Result<(), mpsc::error::SendError<Arc<SseFrame>>> {
        self.sender.send(frame).await
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("recipient_id", &self.recipient_id)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

/// Outcome of a fan-out. Failures are reported here, never as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Connections that matched the target recipient(s)
    pub matched: usize,
    /// Connections that accepted the frame
    pub delivered: usize,
    /// Connections that were closed or did not accept the frame in time
    pub failed: usize,
}

/// Point-in-time hub statistics
#[derive(Debug, Clone, Serialize)]
pub struct HubStats {
    pub total_connections: usize,
    pub unique_recipients: usize,
    pub events_sent: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
}
