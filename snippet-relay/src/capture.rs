//! Text capture hook.
//!
//! Receives end-of-selection events and forwards the selected text to the
//! coordinator without waiting for a reply. Empty selections are dropped.
//! If the coordinator is gone the capture is silently discarded; the page
//! side never sees an error.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wp_snippets::preview;

use crate::coordinator::{CoordinatorHandle, Request};

/// Forwards selections to the coordinator as `captureText` messages.
#[derive(Debug, Clone)]
pub struct CaptureHook {
    coordinator: CoordinatorHandle,
}

impl CaptureHook {
    pub fn new(coordinator: CoordinatorHandle) -> Self {
        Self { coordinator }
    }

    /// Handle one end-of-selection event.
    ///
    /// Returns `true` when a message was handed to the coordinator.
    pub fn on_selection(&self, raw: &str) -> bool {
        let text = raw.trim();
        if text.is_empty() {
            return false;
        }

        match self.coordinator.notify(Request::CaptureText {
            text: text.to_string(),
        }) {
            Ok(()) => {
                debug!(text = %preview(text, 50), "Selection forwarded");
                true
            }
            Err(e) => {
                debug!(error = %e, "Coordinator unreachable, selection dropped");
                false
            }
        }
    }

    /// Treat every line from `reader` as one selection until EOF or `cancel`.
    ///
    /// Returns the number of selections forwarded.
    pub async fn run<R>(&self, reader: R, cancel: CancellationToken) -> std::io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut forwarded = 0;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!(forwarded, "Selection stream cancelled");
                    break;
                }

                line = lines.next_line() => match line? {
                    Some(line) => {
                        if self.on_selection(&line) {
                            forwarded += 1;
                        }
                    }
                    None => {
                        debug!(forwarded, "Selection stream finished");
                        break;
                    }
                },
            }
        }

        Ok(forwarded)
    }
}
