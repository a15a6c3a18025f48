// Infrastructure
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;

// Domain layer
pub mod hub;
pub mod notification;

// Application layer
pub mod api;
pub mod server;
pub mod sse;

// Supporting modules
pub mod shutdown;
pub mod telemetry;
