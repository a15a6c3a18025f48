//! Object-safe emission seam for domain services.

use async_trait::async_trait;
use serde_json::Value;

use super::{DeliveryReport, HubError, NotificationHub};

/// What a domain service needs in order to push events after a commit.
///
/// Services hold an `Arc<dyn Notifier>` rather than the hub itself, which
/// keeps them testable without a live registry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient_id: &str,
        event: &str,
        payload: &Value,
    ) -> Result<DeliveryReport, HubError>;

    async fn broadcast(
        &self,
        recipient_ids: &[String],
        event: &str,
        payload: &Value,
    ) -> Result<DeliveryReport, HubError>;
}

#[async_trait]
impl Notifier for NotificationHub {
    async fn notify(
        &self,
        recipient_id: &str,
        event: &str,
        payload: &Value,
    ) -> Result<DeliveryReport, HubError> {
        NotificationHub::notify(self, recipient_id, event, payload).await
    }

    async fn broadcast(
        &self,
        recipient_ids: &[String],
        event: &str,
        payload: &Value,
    ) -> Result<DeliveryReport, HubError> {
        NotificationHub::broadcast(self, recipient_ids, event, payload).await
    }
}
