//! Text framing for server-push events.

use std::fmt;

use serde::Serialize;

use super::HubError;

/// One encoded server-push event: an event name plus its JSON payload.
///
/// A frame is built once per `notify`/`broadcast` call and shared between
/// every matched connection, so encoding cost does not grow with fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    event: String,
    data: String,
}

impl SseFrame {
    /// Build a frame, JSON-encoding the payload.
    ///
    /// Fails if the event name is empty or spans more than one line, or if the
    /// payload cannot be serialized.
    pub fn new<T>(event: impl Into<String>, payload: &T) -> Result<Self, HubError>
    where
        T: Serialize + ?Sized,
    {
        let event = event.into();
        validate_event_name(&event)?;
        let data = serde_json::to_string(payload)?;
        Ok(Self { event, data })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// The JSON payload, always a single line.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Wire form: `event: <name>\ndata: <json>\n\n`.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event: {}\ndata: {}\n\n", self.event, self.data)
    }
}

/// Event names end up on their own `event:` line, so they must be non-empty
/// and must not contain line breaks.
pub fn validate_event_name(event: &str) -> Result<(), HubError> {
    if event.trim().is_empty() {
        return Err(HubError::InvalidEventName("event name is empty".to_string()));
    }
    if event.contains(['\n', '\r']) {
        return Err(HubError::InvalidEventName(format!(
            "event name {:?} contains a line break",
            event
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_wire_format() {
        let frame = SseFrame::new("status_changed", &json!({"status": "RESOLVED"})).unwrap();
        assert_eq!(
            frame.encode(),
            "event: status_changed\ndata: {\"status\":\"RESOLVED\"}\n\n"
        );
    }

    #[test]
    fn test_pretty_payload_stays_single_line() {
        let frame = SseFrame::new(
            "announcement",
            &json!({"msg": "line one\nline two", "nested": {"a": [1, 2]}}),
        )
        .unwrap();
        assert!(!frame.data().contains('\n'));
        assert_eq!(frame.encode().matches('\n').count(), 3);
    }

    #[test]
    fn test_rejects_multiline_event_name() {
        let err = SseFrame::new("status\nchanged", &json!({})).unwrap_err();
        assert!(matches!(err, HubError::InvalidEventName(_)));
    }

    #[test]
    fn test_rejects_empty_event_name() {
        assert!(SseFrame::new("  ", &json!(null)).is_err());
    }

    #[test]
    fn test_struct_payload() {
        #[derive(Serialize)]
        struct Payload {
            complaint_id: u32,
        }
        let frame = SseFrame::new("complaint", &Payload { complaint_id: 7 }).unwrap();
        assert_eq!(frame.data(), r#"{"complaint_id":7}"#);
    }
}
