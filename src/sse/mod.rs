//! Server-Sent Events subscription endpoint.
//!
//! The transport side of the notification hub. Each accepted request gets a
//! bounded frame channel; the sending half is registered with the hub and the
//! receiving half drives the response stream. When the client disconnects the
//! stream is dropped and the connection is unregistered.
//!
//! # Endpoint
//!
//! `GET /api/v1/notifications/subscribe?token=<JWT_TOKEN>`
//!
//! Or with Authorization header:
//! `GET /api/v1/notifications/subscribe` with `Authorization: Bearer <JWT_TOKEN>`
//!
//! # Event Types
//!
//! - `connected` - Initial confirmation, always the first event
//! - `shutdown` - Server is going away, with a reconnect hint
//! - any domain event emitted through the hub
//!
//! Idle streams carry a `: keep-alive` comment at the configured interval.

mod handler;

pub use handler::{sse_handler, ConnectedPayload, SseQuery, CONNECTED_EVENT};
