//! Cloneable handle for talking to the coordinator.
//!
//! Requests go through a bounded mailbox:
//! - `try_send` fast path, falling back to waiting for a permit with a timeout
//! - `notify` never waits and never reports "no listener" as a caller error
//! - capture notifications are fanned out over a broadcast channel

use std::fmt;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use wp_snippets::{Credentials, SaveResult};

use super::messages::{Ack, CaptureEvent, CapturedText, Envelope, Request, Response};

/// Default mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Default timeout for send operations when the mailbox is full.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// Error type for send operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The coordinator has stopped and is no longer accepting messages.
    ActorStopped,
    /// The mailbox is full.
    MailboxFull,
    /// Waiting for mailbox capacity timed out.
    Timeout,
    /// The coordinator dropped the request without replying.
    NoReply,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::ActorStopped => write!(f, "Coordinator has stopped"),
            SendError::MailboxFull => write!(f, "Mailbox is full"),
            SendError::Timeout => write!(f, "Send operation timed out"),
            SendError::NoReply => write!(f, "Coordinator dropped the request"),
        }
    }
}

impl std::error::Error for SendError {}

/// A handle to the coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Envelope>,
    events: broadcast::Sender<CaptureEvent>,
    cancellation_token: CancellationToken,
    send_timeout: Duration,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        sender: mpsc::Sender<Envelope>,
        events: broadcast::Sender<CaptureEvent>,
        cancellation_token: CancellationToken,
        send_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            events,
            cancellation_token,
            send_timeout,
        }
    }

    /// Send a request and wait for its reply.
    ///
    /// Only delivery problems are errors; failed saves come back as an error
    /// [`SaveResult`] inside the response.
    pub async fn request(&self, request: Request) -> Result<Response, SendError> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(Envelope {
            request,
            reply: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| SendError::NoReply)
    }

    /// Fire-and-forget: enqueue without waiting for capacity or a reply.
    pub fn notify(&self, request: Request) -> Result<(), SendError> {
        let envelope = Envelope {
            request,
            reply: None,
        };
        match self.sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(SendError::MailboxFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendError::ActorStopped),
        }
    }

    async fn enqueue(&self, envelope: Envelope) -> Result<(), SendError> {
        match self.sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(envelope)) => {
                match tokio::time::timeout(self.send_timeout, self.sender.reserve()).await {
                    Ok(Ok(permit)) => {
                        permit.send(envelope);
                        Ok(())
                    }
                    Ok(Err(_)) => Err(SendError::ActorStopped),
                    Err(_) => Err(SendError::Timeout),
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SendError::ActorStopped),
        }
    }

    /// `captureText`, waiting for the acknowledgment.
    pub async fn capture_text(&self, text: impl Into<String>) -> Result<Ack, SendError> {
        match self.request(Request::CaptureText { text: text.into() }).await? {
            Response::Ack(ack) => Ok(ack),
            _ => Err(SendError::NoReply),
        }
    }

    /// `getCapturedText`.
    pub async fn captured_text(&self) -> Result<String, SendError> {
        match self.request(Request::GetCapturedText).await? {
            Response::CapturedText(CapturedText { text }) => Ok(text),
            _ => Err(SendError::NoReply),
        }
    }

    /// `saveText`.
    pub async fn save_text(
        &self,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<SaveResult, SendError> {
        let request = Request::SaveText {
            text: text.into(),
            category: category.into(),
        };
        match self.request(request).await? {
            Response::Save(result) => Ok(result),
            _ => Err(SendError::NoReply),
        }
    }

    /// `getCredentials`.
    pub async fn credentials(&self) -> Result<Credentials, SendError> {
        match self.request(Request::GetCredentials).await? {
            Response::Credentials(credentials) => Ok(credentials),
            _ => Err(SendError::NoReply),
        }
    }

    /// Listen for `textCaptured` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    /// Get the current and maximum mailbox capacity.
    ///
    /// Returns `(current_available, max_capacity)`.
    pub fn mailbox_capacity(&self) -> (usize, usize) {
        (self.sender.capacity(), self.sender.max_capacity())
    }

    /// Stop the coordinator. In-flight saves still run to completion.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Whether the coordinator loop has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("capacity", &self.mailbox_capacity())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
