//! Coordinator actor.
//!
//! Owns the single captured-text slot and routes every request to the
//! credential store or the remote client. Requests are taken from the
//! mailbox in arrival order; a save reads credentials in order and then runs
//! its network call on a separate task, so later requests are served while
//! it is in flight and saves may complete out of order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};
use wp_snippets::{SaveResult, SnippetApi, preview};

use super::handle::{CoordinatorHandle, DEFAULT_MAILBOX_CAPACITY, DEFAULT_SEND_TIMEOUT};
use super::messages::{Ack, CaptureEvent, CapturedText, Envelope, Request, Response};
use crate::credentials::CredentialStore;

/// Default capacity of the capture notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub mailbox_capacity: usize,
    pub event_capacity: usize,
    /// How long `request` waits for mailbox capacity.
    pub send_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// The background coordinator.
pub struct Coordinator {
    mailbox: mpsc::Receiver<Envelope>,
    /// Most recent capture. Each capture overwrites the previous one.
    captured_text: String,
    store: Arc<dyn CredentialStore>,
    api: Arc<dyn SnippetApi>,
    events: broadcast::Sender<CaptureEvent>,
    cancellation_token: CancellationToken,
    /// In-flight saves, awaited on shutdown.
    saves: TaskTracker,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        api: Arc<dyn SnippetApi>,
        config: CoordinatorConfig,
        cancellation_token: CancellationToken,
    ) -> (Self, CoordinatorHandle) {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let handle = CoordinatorHandle::new(
            tx,
            events.clone(),
            cancellation_token.clone(),
            config.send_timeout,
        );
        let coordinator = Self {
            mailbox: rx,
            captured_text: String::new(),
            store,
            api,
            events,
            cancellation_token,
            saves: TaskTracker::new(),
        };
        (coordinator, handle)
    }

    /// Create a coordinator and run it on the current runtime.
    pub fn spawn(
        store: Arc<dyn CredentialStore>,
        api: Arc<dyn SnippetApi>,
        config: CoordinatorConfig,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (coordinator, handle) = Self::new(store, api, config, CancellationToken::new());
        let task = tokio::spawn(coordinator.run());
        (handle, task)
    }

    /// Process messages until cancelled or every handle is dropped.
    pub async fn run(mut self) {
        info!("Coordinator started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => {
                    debug!("Coordinator cancelled");
                    break;
                }
                envelope = self.mailbox.recv() => {
                    match envelope {
                        Some(envelope) => self.handle(envelope).await,
                        None => {
                            debug!("All coordinator handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        self.mailbox.close();
        self.saves.close();
        if !self.saves.is_empty() {
            info!(pending = self.saves.len(), "Waiting for in-flight saves");
        }
        self.saves.wait().await;
        info!("Coordinator stopped");
    }

    async fn handle(&mut self, envelope: Envelope) {
        let Envelope { request, reply } = envelope;
        debug!(kind = request.kind(), "Handling message");

        match request {
            Request::CaptureText { text } => {
                debug!(text = %preview(&text, 50), "Captured text");
                self.captured_text = text;
                // No subscriber just means no UI surface is open.
                let _ = self.events.send(CaptureEvent::TextCaptured {
                    text: self.captured_text.clone(),
                });
                deliver(reply, Response::Ack(Ack::captured()));
            }
            Request::GetCapturedText => {
                let text = self.captured_text.clone();
                deliver(reply, Response::CapturedText(CapturedText { text }));
            }
            Request::SaveText { text, category } => {
                let credentials = self.store.get().await;
                let api = Arc::clone(&self.api);
                self.saves.spawn(async move {
                    let result = run_save(api, text, category, credentials).await;
                    deliver(reply, Response::Save(result));
                });
            }
            Request::GetCredentials => {
                let credentials = self.store.get().await;
                deliver(reply, Response::Credentials(credentials));
            }
        }
    }
}

/// Run one save on its own task so a panic in the client becomes an error result.
async fn run_save(
    api: Arc<dyn SnippetApi>,
    text: String,
    category: String,
    credentials: wp_snippets::Credentials,
) -> SaveResult {
    let task = tokio::spawn(async move { api.save(&text, &category, &credentials).await });
    match task.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Save task failed");
            SaveResult::error(format!("Failed to save text: internal error ({e})"))
        }
    }
}

/// Best-effort reply. The caller may have gone away (UI closed).
fn deliver(reply: Option<oneshot::Sender<Response>>, response: Response) {
    if let Some(reply) = reply
        && reply.send(response).is_err()
    {
        debug!("Reply dropped, caller is no longer listening");
    }
}
