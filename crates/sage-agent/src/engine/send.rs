//! The send turn: optimistic append, stream drain, reconciliation.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sage_common::{new_correlation_id, StateEvent};

use crate::event::StreamEvent;
use crate::streaming::{drain_frames, StreamEnd};
use crate::transcript::{Message, Reducer};
use crate::EngineError;

use super::manager::ChatEngine;
use super::types::SendGuard;

/// Shown when the stream cannot be opened or dies mid-read.
const CONNECT_ERROR_TEXT: &str = "Sorry, I encountered an error connecting to the server.";

/// Longest title derived from a first message.
const DERIVED_TITLE_MAX: usize = 60;

impl ChatEngine {
    /// Send one user message and drain the agent's streamed reply.
    ///
    /// Rejects empty input and concurrent sends. With no active session,
    /// one is created first (title derived from the text) and the rest
    /// of the call runs against it. The user message is appended
    /// optimistically and never retracted: a transport failure surfaces
    /// as a trailing error message, not as an `Err`.
    ///
    /// The cancellation token is honored between fragments; events
    /// already folded stay in the transcript.
    pub async fn send(&mut self, text: &str, cancel: &CancellationToken) -> Result<(), EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::EmptyMessage);
        }
        let guard = SendGuard::acquire(&self.sending)?;

        let corr = new_correlation_id();

        let session_id = match self.active {
            Some(id) => id,
            // Auto-create at most once per call. A failure here aborts
            // the send before anything is appended.
            None => self.create_session(&derive_title(text)).await?,
        };
        debug!(corr = %corr, session = %session_id, "chat turn started");

        self.transcript.push(Message::user(text));
        self.bus.publish(StateEvent::TranscriptChanged);
        self.set_status(Some("Thinking...".to_string()));

        let mut reducer = Reducer::new();
        let outcome = match self.backend.send_message(session_id, text).await {
            Ok(fragments) => {
                let transcript = &mut self.transcript;
                let status = &mut self.status;
                let bus = &self.bus;
                drain_frames(fragments, cancel, |frame| {
                    let Some(event) = StreamEvent::parse(&frame) else {
                        return;
                    };
                    if reducer.fold(transcript, event) {
                        bus.publish(StateEvent::TranscriptChanged);
                    }
                    if reducer.status() != status.as_deref() {
                        *status = reducer.status().map(str::to_string);
                        bus.publish(StateEvent::StatusChanged(status.clone()));
                    }
                })
                .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(StreamEnd::Completed) => {
                debug!(corr = %corr, "stream drained");
                self.set_status(None);
                self.reconcile().await;
            }
            Ok(StreamEnd::Cancelled) => {
                // Whatever was folded stays; the caller is tearing the
                // view down, so reconciliation is left to the next mount.
                debug!(corr = %corr, "stream cancelled");
                self.set_status(None);
            }
            Err(e) => {
                warn!(corr = %corr, "stream failed: {e}");
                self.transcript.push(Message::error(CONNECT_ERROR_TEXT));
                self.bus.publish(StateEvent::TranscriptChanged);
                self.set_status(None);
                self.reconcile().await;
            }
        }

        drop(guard);
        self.bus.publish(StateEvent::TurnFinished);
        Ok(())
    }

    fn set_status(&mut self, status: Option<String>) {
        if self.status != status {
            self.status = status;
            self.bus.publish(StateEvent::StatusChanged(self.status.clone()));
        }
    }

    /// Post-stream reconciliation: pick up the server-side title/order
    /// changes a turn may have made, and the goal it may have created or
    /// updated. Failures are logged; local state stays as-is.
    async fn reconcile(&mut self) {
        if let Err(e) = self.refresh_sessions().await {
            warn!("failed to refresh sessions after turn: {e}");
        }
        self.refresh_goal().await;
    }
}

/// Derive a session title from the first message: first five words,
/// capped at [`DERIVED_TITLE_MAX`] chars.
fn derive_title(text: &str) -> String {
    let mut title = text
        .split_whitespace()
        .take(5)
        .collect::<Vec<_>>()
        .join(" ");
    if title.len() > DERIVED_TITLE_MAX {
        let mut cut = DERIVED_TITLE_MAX;
        while !title.is_char_boundary(cut) {
            cut -= 1;
        }
        title.truncate(cut);
    }
    title
}

#[cfg(test)]
mod tests {
    use super::derive_title;

    #[test]
    fn takes_first_five_words() {
        assert_eq!(
            derive_title("help me learn linear algebra before finals"),
            "help me learn linear algebra"
        );
    }

    #[test]
    fn short_messages_pass_through() {
        assert_eq!(derive_title("learn Rust"), "learn Rust");
    }

    #[test]
    fn long_words_are_capped_on_a_char_boundary() {
        let word = "é".repeat(80);
        let title = derive_title(&word);
        assert!(title.len() <= 60);
        assert!(title.chars().all(|c| c == 'é'));
    }
}
