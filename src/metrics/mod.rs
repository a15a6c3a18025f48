//! Prometheus metrics for the notification service.
//!
//! - Connection metrics (open connections, connected recipients, lifetimes)
//! - Delivery metrics (events sent by target, deliveries, failures)
//! - Fan-out latency

mod helpers;

pub use helpers::{encode_metrics, ConnectionMetrics, HubMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "apartment_notify";

lazy_static! {
    // ============================================================================
    // Connection Metrics
    // ============================================================================

    /// Number of open SSE connections
    pub static ref CONNECTIONS_TOTAL: IntGauge = register_int_gauge!(
        format!("{}_connections_total", METRIC_PREFIX),
        "Number of open SSE connections"
    ).unwrap();

    /// Number of recipients with at least one open connection
    pub static ref RECIPIENTS_CONNECTED: IntGauge = register_int_gauge!(
        format!("{}_recipients_connected", METRIC_PREFIX),
        "Number of recipients with at least one open connection"
    ).unwrap();

    /// Total SSE connections accepted
    pub static ref SSE_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_sse_connections_opened_total", METRIC_PREFIX),
        "Total SSE connections accepted"
    ).unwrap();

    /// Total SSE connections closed
    pub static ref SSE_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_sse_connections_closed_total", METRIC_PREFIX),
        "Total SSE connections closed"
    ).unwrap();

    /// SSE connection lifetime
    pub static ref SSE_CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_sse_connection_duration_seconds", METRIC_PREFIX),
        "SSE connection lifetime in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 14400.0]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Events emitted by target type
    pub static ref EVENTS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_sent_total", METRIC_PREFIX),
        "Total events emitted",
        &["target"]
    ).unwrap();

    /// Frames accepted by a connection
    pub static ref DELIVERIES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_deliveries_total", METRIC_PREFIX),
        "Total frames accepted by connections"
    ).unwrap();

    /// Frames a connection did not accept
    pub static ref DELIVERY_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_delivery_failures_total", METRIC_PREFIX),
        "Total frames not accepted by connections (closed or timed out)"
    ).unwrap();

    /// Time to fan one frame out to all matched connections
    pub static ref FANOUT_LATENCY: Histogram = register_histogram!(
        format!("{}_fanout_latency_seconds", METRIC_PREFIX),
        "Fan-out latency in seconds",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();
}
