use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use smallvec::SmallVec;
use tokio::time::timeout;

use crate::metrics::HubMetrics;

use super::{
    ConnectionHandle, ConnectionId, DeliveryReport, FrameSender, HubError, HubStats, SseFrame,
};

/// Default bound on a single connection write during fan-out
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(2000);

/// Most recipients hold one or two tabs open
type RecipientConnections = SmallVec<[Arc<ConnectionHandle>; 4]>;

#[derive(Debug, Default)]
struct HubCounters {
    events_sent: AtomicU64,
    total_delivered: AtomicU64,
    total_failed: AtomicU64,
}

/// Registry of open push connections, keyed by recipient.
///
/// One instance is built at startup and shared as `Arc<NotificationHub>`.
/// Mutations are serialized per recipient by the map's shard locks, and no
/// lock is held while frames are being written.
pub struct NotificationHub {
    /// recipient_id -> connections in registration order
    recipients: DashMap<String, RecipientConnections>,
    connection_count: AtomicUsize,
    send_timeout: Duration,
    counters: HubCounters,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_send_timeout(DEFAULT_SEND_TIMEOUT)
    }

    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            recipients: DashMap::new(),
            connection_count: AtomicUsize::new(0),
            send_timeout,
            counters: HubCounters::default(),
        }
    }

    /// Register a new connection for a recipient
    pub fn register(&self, recipient_id: impl Into<String>, sender: FrameSender) -> ConnectionId {
        let handle = Arc::new(ConnectionHandle::new(recipient_id.into(), sender));
        let connection_id = handle.id;

        tracing::info!(
            connection_id = %connection_id,
            recipient_id = %handle.recipient_id,
            "Connection registered"
        );

        let mut conns = self.recipients.entry(handle.recipient_id.clone()).or_default();
        conns.push(handle);
        // Counted under the shard lock so a racing removal never sees it first
        self.connection_count.fetch_add(1, Ordering::Relaxed);
        drop(conns);

        connection_id
    }

    /// Remove a connection. Returns false if the pair was not registered.
    pub fn unregister(&self, recipient_id: &str, connection_id: ConnectionId) -> bool {
        let removed = match self.recipients.get_mut(recipient_id) {
            Some(mut conns) => match conns.iter().position(|h| h.id == connection_id) {
                Some(pos) => {
                    conns.remove(pos);
                    self.connection_count.fetch_sub(1, Ordering::Relaxed);
                    true
                }
                None => false,
            },
            None => false,
        };

        if !removed {
            tracing::trace!(
                connection_id = %connection_id,
                recipient_id = %recipient_id,
                "Connection already unregistered"
            );
            return false;
        }

        // Checked under the shard lock, so a concurrent register is never dropped
        self.recipients
            .remove_if(recipient_id, |_, conns| conns.is_empty());

        tracing::info!(
            connection_id = %connection_id,
            recipient_id = %recipient_id,
            "Connection unregistered"
        );

        true
    }

    /// Write one event to every connection of `recipient_id`.
    ///
    /// An offline recipient is not an error. Write failures are isolated per
    /// connection and only show up in the returned report; the failing
    /// connection stays registered until its transport closes it.
    #[tracing::instrument(
        name = "hub.notify",
        skip_all,
        fields(recipient_id = %recipient_id, event = %event)
    )]
    pub async fn notify<T>(
        &self,
        recipient_id: &str,
        event: &str,
        payload: &T,
    ) -> Result<DeliveryReport, HubError>
    where
        T: Serialize + ?Sized,
    {
        let frame = Arc::new(SseFrame::new(event, payload)?);
        let report = self.send_frame(recipient_id, &frame).await;

        self.record(&report);
        HubMetrics::record_sent("recipient", &report);

        Ok(report)
    }

    /// `notify` for several recipients in one fan-out.
    ///
    /// The frame is encoded once and every matched connection is written
    /// concurrently, so a stalled recipient costs at most one `send_timeout`
    /// for the whole call.
    #[tracing::instrument(
        name = "hub.broadcast",
        skip_all,
        fields(recipient_count = recipient_ids.len(), event = %event)
    )]
    pub async fn broadcast<S, T>(
        &self,
        recipient_ids: &[S],
        event: &str,
        payload: &T,
    ) -> Result<DeliveryReport, HubError>
    where
        S: AsRef<str>,
        T: Serialize + ?Sized,
    {
        let frame = Arc::new(SseFrame::new(event, payload)?);
        let targets: Vec<Arc<ConnectionHandle>> = recipient_ids
            .iter()
            .flat_map(|recipient_id| self.snapshot(recipient_id.as_ref()))
            .collect();

        let report = if targets.is_empty() {
            DeliveryReport::default()
        } else {
            self.deliver(&targets, &frame).await
        };

        self.record(&report);
        HubMetrics::record_sent("recipients", &report);

        tracing::debug!(
            matched = report.matched,
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast to recipients"
        );

        Ok(report)
    }

    /// Write one event to every open connection, regardless of recipient.
    pub async fn notify_all<T>(&self, event: &str, payload: &T) -> Result<DeliveryReport, HubError>
    where
        T: Serialize + ?Sized,
    {
        let frame = Arc::new(SseFrame::new(event, payload)?);
        let targets: Vec<Arc<ConnectionHandle>> = self
            .recipients
            .iter()
            .flat_map(|entry| entry.value().iter().cloned().collect::<Vec<_>>())
            .collect();

        let report = self.deliver(&targets, &frame).await;

        self.record(&report);
        HubMetrics::record_sent("all", &report);

        Ok(report)
    }

    /// Fan a pre-encoded frame out to one recipient's connections
    pub async fn send_frame(&self, recipient_id: &str, frame: &Arc<SseFrame>) -> DeliveryReport {
        let targets = self.snapshot(recipient_id);
        if targets.is_empty() {
            tracing::trace!(recipient_id = %recipient_id, "Recipient offline, event dropped");
            return DeliveryReport::default();
        }

        self.deliver(&targets, frame).await
    }

    /// Drop every connection. Each transport sees its channel close and ends
    /// its stream. Returns the number of connections closed.
    ///
    /// Repeats until the map is empty, so a connection registered while a
    /// pass is running is closed as well.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        while !self.recipients.is_empty() {
            self.recipients.retain(|_, conns| {
                closed += conns.len();
                self.connection_count.fetch_sub(conns.len(), Ordering::Relaxed);
                false
            });
        }

        tracing::info!(closed = closed, "Closed all connections");
        closed
    }

    /// Snapshot of a recipient's connections
    pub fn connections(&self, recipient_id: &str) -> Vec<Arc<ConnectionHandle>> {
        self.snapshot(recipient_id).into_vec()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_count.load(Ordering::Relaxed)
    }

    pub fn is_online(&self, recipient_id: &str) -> bool {
        self.recipients.contains_key(recipient_id)
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            total_connections: self.connection_count(),
            unique_recipients: self.recipients.len(),
            events_sent: self.counters.events_sent.load(Ordering::Relaxed),
            total_delivered: self.counters.total_delivered.load(Ordering::Relaxed),
            total_failed: self.counters.total_failed.load(Ordering::Relaxed),
        }
    }

    /// Clone the handles out so the shard lock is released before any await
    fn snapshot(&self, recipient_id: &str) -> RecipientConnections {
        self.recipients
            .get(recipient_id)
            .map(|conns| conns.value().clone())
            .unwrap_or_default()
    }

    /// Send to all targets concurrently, each write bounded by `send_timeout`
    async fn deliver(&self, targets: &[Arc<ConnectionHandle>], frame: &Arc<SseFrame>) -> DeliveryReport {
        let start = Instant::now();
        let send_timeout = self.send_timeout;

        let mut sends: FuturesUnordered<_> = targets
            .iter()
            .map(|handle| {
                let frame = Arc::clone(frame);
                async move {
                    match timeout(send_timeout, handle.send(frame)).await {
                        Ok(Ok(())) => true,
                        Ok(Err(_)) => {
                            tracing::debug!(
                                connection_id = %handle.id,
                                recipient_id = %handle.recipient_id,
                                "Connection closed, frame not delivered"
                            );
                            false
                        }
                        Err(_) => {
                            tracing::debug!(
                                connection_id = %handle.id,
                                recipient_id = %handle.recipient_id,
                                timeout_ms = send_timeout.as_millis() as u64,
                                "Frame send timed out"
                            );
                            false
                        }
                    }
                }
            })
            .collect();

        let mut report = DeliveryReport {
            matched: targets.len(),
            ..DeliveryReport::default()
        };
        while let Some(ok) = sends.next().await {
            if ok {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        HubMetrics::observe_fanout(start.elapsed());
        report
    }

    fn record(&self, report: &DeliveryReport) {
        self.counters.events_sent.fetch_add(1, Ordering::Relaxed);
        self.counters
            .total_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.counters
            .total_failed
            .fetch_add(report.failed as u64, Ordering::Relaxed);
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
