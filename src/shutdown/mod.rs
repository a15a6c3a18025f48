//! Graceful shutdown handling for the notification service.
//!
//! SSE responses never finish on their own, so the HTTP server cannot drain
//! until every stream is closed. The sequence is:
//! 1. Tell every connected client the server is going away
//! 2. Close every connection in the hub, which ends each stream

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use crate::hub::NotificationHub;

/// Name of the event sent before connections are closed
pub const SHUTDOWN_EVENT: &str = "shutdown";

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time allowed for the shutdown event fan-out (default: 5 seconds)
    pub client_notification_timeout: Duration,
    /// Suggested reconnect delay to send to clients (default: 5 seconds)
    pub reconnect_after_seconds: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            client_notification_timeout: Duration::from_secs(5),
            reconnect_after_seconds: 5,
        }
    }
}

#[derive(Debug, Serialize)]
struct ShutdownPayload<'a> {
    reason: &'a str,
    reconnect_after: u64,
}

/// Handles graceful shutdown of the notification hub
pub struct GracefulShutdown {
    hub: Arc<NotificationHub>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(hub: Arc<NotificationHub>) -> Self {
        Self::with_config(hub, ShutdownConfig::default())
    }

    pub fn with_config(hub: Arc<NotificationHub>, config: ShutdownConfig) -> Self {
        Self { hub, config }
    }

    /// Execute graceful shutdown sequence
    #[tracing::instrument(
        name = "graceful_shutdown",
        skip(self),
        fields(total_connections = self.hub.connection_count())
    )]
    pub async fn execute(&self, reason: &str) -> ShutdownResult {
        let start = std::time::Instant::now();
        let mut result = ShutdownResult::default();

        tracing::info!(reason = %reason, "Starting graceful shutdown - Phase 1: Notifying clients");
        result.clients_notified = self.notify_clients(reason).await;

        tracing::info!("Phase 2: Closing connections");
        result.connections_closed = self.hub.close_all();

        result.duration = start.elapsed();

        tracing::info!(
            clients_notified = result.clients_notified,
            connections_closed = result.connections_closed,
            duration_ms = result.duration.as_millis() as u64,
            "Graceful shutdown completed"
        );

        result
    }

    async fn notify_clients(&self, reason: &str) -> usize {
        if self.hub.connection_count() == 0 {
            return 0;
        }

        let payload = ShutdownPayload {
            reason,
            reconnect_after: self.config.reconnect_after_seconds,
        };

        match timeout(
            self.config.client_notification_timeout,
            self.hub.notify_all(SHUTDOWN_EVENT, &payload),
        )
        .await
        {
            Ok(Ok(report)) => report.delivered,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to encode shutdown event");
                0
            }
            Err(_) => {
                tracing::warn!("Timed out sending shutdown notifications");
                0
            }
        }
    }
}

/// Result of a graceful shutdown operation
#[derive(Debug, Default)]
pub struct ShutdownResult {
    /// Number of connections that accepted the shutdown event
    pub clients_notified: usize,
    /// Number of connections closed
    pub connections_closed: usize,
    /// Total time taken for shutdown
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_shutdown_no_connections() {
        let hub = Arc::new(NotificationHub::new());
        let result = GracefulShutdown::new(hub).execute("test shutdown").await;

        assert_eq!(result.clients_notified, 0);
        assert_eq!(result.connections_closed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_notifies_then_closes() {
        let hub = Arc::new(NotificationHub::new());
        let (tx, mut rx) = mpsc::channel(4);
        hub.register("resident-1", tx);

        let result = GracefulShutdown::new(hub.clone()).execute("deploy").await;

        assert_eq!(result.clients_notified, 1);
        assert_eq!(result.connections_closed, 1);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event(), SHUTDOWN_EVENT);
        assert_eq!(frame.data(), r#"{"reason":"deploy","reconnect_after":5}"#);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_shutdown_config_defaults() {
        let config = ShutdownConfig::default();
        assert_eq!(config.client_notification_timeout, Duration::from_secs(5));
        assert_eq!(config.reconnect_after_seconds, 5);
    }
}
