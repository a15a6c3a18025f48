//! In-memory registry of live push connections.
//!
//! The hub maps each recipient to the connections currently open for them
//! and fans named events out to those connections. Delivery is best-effort
//! and at-most-once:
//!
//! - an offline recipient simply misses the event (no queue, no retry)
//! - a failed or slow write to one connection never blocks the others
//! - connections leave the registry only when their transport closes them
//!
//! # Wire format
//!
//! ```text
//! event: <name>
//! data: <json payload>
//!
//! ```

mod frame;
mod notifier;
mod registry;
mod types;

use thiserror::Error;

pub use frame::{validate_event_name, SseFrame};
pub use notifier::Notifier;
pub use registry::{NotificationHub, DEFAULT_SEND_TIMEOUT};
pub use types::{
    ConnectionHandle, ConnectionId, DeliveryReport, FrameReceiver, FrameSender, HubStats,
};

/// Errors raised before any frame is written
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Invalid event name: {0}")]
    InvalidEventName(String),

    #[error("Payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}
