//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use crate::hub::{DeliveryReport, HubStats};

use super::{
    CONNECTIONS_TOTAL, DELIVERIES_TOTAL, DELIVERY_FAILURES_TOTAL, EVENTS_SENT_TOTAL,
    FANOUT_LATENCY, RECIPIENTS_CONNECTED, SSE_CONNECTIONS_CLOSED, SSE_CONNECTIONS_OPENED,
    SSE_CONNECTION_DURATION,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording hub delivery metrics
pub struct HubMetrics;

impl HubMetrics {
    /// Record one emitted event and its per-connection outcome
    pub fn record_sent(target: &str, report: &DeliveryReport) {
        EVENTS_SENT_TOTAL.with_label_values(&[target]).inc();
        DELIVERIES_TOTAL.inc_by(report.delivered as u64);
        DELIVERY_FAILURES_TOTAL.inc_by(report.failed as u64);
    }

    pub fn observe_fanout(elapsed: Duration) {
        FANOUT_LATENCY.observe(elapsed.as_secs_f64());
    }

    /// Refresh gauges from a stats snapshot (scrape time)
    pub fn set_gauges(stats: &HubStats) {
        CONNECTIONS_TOTAL.set(stats.total_connections as i64);
        RECIPIENTS_CONNECTED.set(stats.unique_recipients as i64);
    }
}

/// Helper struct for SSE connection lifecycle metrics
pub struct ConnectionMetrics;

impl ConnectionMetrics {
    pub fn opened() {
        SSE_CONNECTIONS_OPENED.inc();
    }

    pub fn closed(lifetime: Duration) {
        SSE_CONNECTIONS_CLOSED.inc();
        SSE_CONNECTION_DURATION.observe(lifetime.as_secs_f64());
    }
}
