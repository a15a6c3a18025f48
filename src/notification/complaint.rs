use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hub::{DeliveryReport, HubError, Notifier};

pub const COMPLAINT_STATUS_CHANGED: &str = "complaint_status_changed";
pub const NOTICE_PUBLISHED: &str = "notice_published";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

/// Payload pushed to a complaint's author when an administrator moves it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintStatusChanged {
    pub complaint_id: String,
    pub apartment_id: String,
    pub title: String,
    pub previous_status: ComplaintStatus,
    pub status: ComplaintStatus,
    pub updated_at: DateTime<Utc>,
}

/// Payload pushed to residents when a notice goes up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticePublished {
    pub notice_id: String,
    pub apartment_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Emits domain events through a [`Notifier`].
///
/// Call these only after the state change has been committed. A missed push
/// is acceptable; the state stays queryable through the regular read APIs.
#[derive(Clone)]
pub struct ComplaintNotifier {
    notifier: Arc<dyn Notifier>,
}

impl ComplaintNotifier {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    #[tracing::instrument(
        name = "complaint.status_changed",
        skip_all,
        fields(complaint_id = %change.complaint_id, author_id = %author_id)
    )]
    pub async fn status_changed(
        &self,
        author_id: &str,
        change: &ComplaintStatusChanged,
    ) -> Result<DeliveryReport, HubError> {
        if change.previous_status == change.status {
            tracing::debug!("Status unchanged, nothing to push");
            return Ok(DeliveryReport::default());
        }

        let payload = serde_json::to_value(change)?;
        let report = self
            .notifier
            .notify(author_id, COMPLAINT_STATUS_CHANGED, &payload)
            .await?;

        tracing::debug!(
            delivered = report.delivered,
            failed = report.failed,
            "Complaint status pushed"
        );
        Ok(report)
    }

    #[tracing::instrument(
        name = "complaint.notice_published",
        skip_all,
        fields(notice_id = %notice.notice_id, resident_count = resident_ids.len())
    )]
    pub async fn notice_published(
        &self,
        resident_ids: &[String],
        notice: &NoticePublished,
    ) -> Result<DeliveryReport, HubError> {
        let payload = serde_json::to_value(notice)?;
        self.notifier
            .broadcast(resident_ids, NOTICE_PUBLISHED, &payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    use crate::hub::NotificationHub;

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<(Vec<String>, String, Value)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            recipient_id: &str,
            event: &str,
            payload: &Value,
        ) -> Result<DeliveryReport, HubError> {
            self.calls.lock().unwrap().push((
                vec![recipient_id.to_string()],
                event.to_string(),
                payload.clone(),
            ));
            Ok(DeliveryReport::default())
        }

        async fn broadcast(
            &self,
            recipient_ids: &[String],
            event: &str,
            payload: &Value,
        ) -> Result<DeliveryReport, HubError> {
            self.calls.lock().unwrap().push((
                recipient_ids.to_vec(),
                event.to_string(),
                payload.clone(),
            ));
            Ok(DeliveryReport::default())
        }
    }

    fn change(previous: ComplaintStatus, status: ComplaintStatus) -> ComplaintStatusChanged {
        ComplaintStatusChanged {
            complaint_id: "c-1".to_string(),
            apartment_id: "apt-1".to_string(),
            title: "Leaking pipe".to_string(),
            previous_status: previous,
            status,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_status_change_targets_author() {
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier = ComplaintNotifier::new(recorder.clone());

        notifier
            .status_changed(
                "resident-1",
                &change(ComplaintStatus::InProgress, ComplaintStatus::Resolved),
            )
            .await
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (recipients, event, payload) = &calls[0];
        assert_eq!(recipients, &vec!["resident-1".to_string()]);
        assert_eq!(event, COMPLAINT_STATUS_CHANGED);
        assert_eq!(payload["status"], "RESOLVED");
        assert_eq!(payload["previous_status"], "IN_PROGRESS");
    }

    #[tokio::test]
    async fn test_unchanged_status_is_skipped() {
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier = ComplaintNotifier::new(recorder.clone());

        let report = notifier
            .status_changed(
                "resident-1",
                &change(ComplaintStatus::Pending, ComplaintStatus::Pending),
            )
            .await
            .unwrap();

        assert_eq!(report, DeliveryReport::default());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notice_published_through_hub() {
        let hub = Arc::new(NotificationHub::new());
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx3, mut rx3) = mpsc::channel(4);
        hub.register("resident-1", tx1);
        hub.register("resident-3", tx3);

        let notifier = ComplaintNotifier::new(hub.clone());
        let residents = vec![
            "resident-1".to_string(),
            "resident-2".to_string(),
            "resident-3".to_string(),
        ];
        let notice = NoticePublished {
            notice_id: "n-9".to_string(),
            apartment_id: "apt-1".to_string(),
            title: "Water shutoff Friday".to_string(),
            published_at: Utc::now(),
        };

        let report = notifier.notice_published(&residents, &notice).await.unwrap();

        assert_eq!(report.matched, 2);
        assert_eq!(report.delivered, 2);
        assert_eq!(rx1.recv().await.unwrap().event(), NOTICE_PUBLISHED);
        assert!(rx3.recv().await.unwrap().data().contains("\"notice_id\":\"n-9\""));
    }
}
