//! Message types exchanged with the coordinator.
//!
//! - [`Request`]: the four message kinds callers may send, tagged on `type`
//! - [`Response`]: the matching reply shapes
//! - [`CaptureEvent`]: broadcast to open UI surfaces after each capture

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use wp_snippets::{Credentials, SaveResult, SaveStatus};

/// Acknowledgment message for a capture.
pub const CAPTURE_ACK_MESSAGE: &str = "Text captured.";

/// A message sent to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Replace the pending captured text.
    CaptureText { text: String },
    /// Read the pending captured text.
    GetCapturedText,
    /// Save text to the remote store under `category`.
    SaveText {
        text: String,
        #[serde(default)]
        category: String,
    },
    /// Read the stored credentials (UI surfaces that list snippets themselves).
    GetCredentials,
}

impl Request {
    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CaptureText { .. } => "captureText",
            Self::GetCapturedText => "getCapturedText",
            Self::SaveText { .. } => "saveText",
            Self::GetCredentials => "getCredentials",
        }
    }
}

/// `{status: "success", message: "Text captured."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: SaveStatus,
    pub message: String,
}

impl Ack {
    pub fn captured() -> Self {
        Self {
            status: SaveStatus::Success,
            message: CAPTURE_ACK_MESSAGE.to_string(),
        }
    }
}

/// `{text}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedText {
    pub text: String,
}

/// Reply to a [`Request`]. Serializes to the bare payload, without a wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ack(Ack),
    CapturedText(CapturedText),
    Save(SaveResult),
    Credentials(Credentials),
}

/// Notification pushed to listening UI surfaces after each capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CaptureEvent {
    TextCaptured { text: String },
}

/// A request together with its optional reply channel.
///
/// Fire-and-forget senders pass `None`.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub request: Request,
    pub reply: Option<oneshot::Sender<Response>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let capture: Request =
            serde_json::from_value(json!({"type": "captureText", "text": "hi"})).unwrap();
        assert_eq!(capture, Request::CaptureText { text: "hi".into() });

        let get: Request = serde_json::from_value(json!({"type": "getCapturedText"})).unwrap();
        assert_eq!(get, Request::GetCapturedText);

        let save: Request =
            serde_json::from_value(json!({"type": "saveText", "text": "t", "category": "c"}))
                .unwrap();
        assert_eq!(
            save,
            Request::SaveText {
                text: "t".into(),
                category: "c".into()
            }
        );

        let no_category: Request =
            serde_json::from_value(json!({"type": "saveText", "text": "t"})).unwrap();
        assert_eq!(no_category.kind(), "saveText");

        let creds: Request = serde_json::from_value(json!({"type": "getCredentials"})).unwrap();
        assert_eq!(creds, Request::GetCredentials);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_value::<Request>(json!({"type": "deleteText"})).is_err());
        assert!(serde_json::from_value::<Request>(json!({"type": "captureText"})).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let ack = serde_json::to_value(Response::Ack(Ack::captured())).unwrap();
        assert_eq!(ack, json!({"status": "success", "message": "Text captured."}));

        let text = serde_json::to_value(Response::CapturedText(CapturedText { text: "x".into() }))
            .unwrap();
        assert_eq!(text, json!({"text": "x"}));

        let save = serde_json::to_value(Response::Save(SaveResult::success(Some(42)))).unwrap();
        assert_eq!(save["postId"], 42);

        let creds = serde_json::to_value(Response::Credentials(Credentials::new(
            "https://example.com",
            "admin",
            "pw",
        )))
        .unwrap();
        assert_eq!(
            creds,
            json!({"endpointBaseUrl": "https://example.com", "username": "admin", "secret": "pw"})
        );
    }

    #[test]
    fn test_capture_event_wire_format() {
        let event = CaptureEvent::TextCaptured { text: "x".into() };
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({"type": "textCaptured", "text": "x"})
        );
    }
}
