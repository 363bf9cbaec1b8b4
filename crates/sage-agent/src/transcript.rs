//! The ordered message history of one conversation and the fold rules
//! that apply streamed events to it.
//!
//! A turn appends the user's message first (optimistically, before the
//! network call), then folds agent events as they arrive. At most one
//! trailing agent message is "open" for streaming appends at any time;
//! the [`Reducer`] tracks which one.

use tracing::debug;

use sage_common::StoredMessage;

use crate::event::{PlanContent, ResourceContent, StreamEvent};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// Presentation category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Chat,
    Plan,
    Resources,
    Error,
}

/// Structured payload attached to plan/resources messages.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredPayload {
    Plan(PlanContent),
    Resources(ResourceContent),
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub body: String,
    pub kind: MessageKind,
    pub payload: Option<StructuredPayload>,
}

impl Message {
    pub fn user(body: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            body: body.into(),
            kind: MessageKind::Chat,
            payload: None,
        }
    }

    fn agent() -> Self {
        Self {
            role: Role::Agent,
            body: String::new(),
            kind: MessageKind::Chat,
            payload: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            body: text.into(),
            kind: MessageKind::Error,
            payload: None,
        }
    }
}

impl From<&StoredMessage> for Message {
    fn from(stored: &StoredMessage) -> Self {
        let role = match stored.role.as_str() {
            "user" => Role::User,
            _ => Role::Agent,
        };
        let kind = match stored.msg_type.as_str() {
            "plan" => MessageKind::Plan,
            "resources" => MessageKind::Resources,
            "error" => MessageKind::Error,
            _ => MessageKind::Chat,
        };
        let payload = stored.content.as_deref().and_then(|raw| match kind {
            MessageKind::Plan => serde_json::from_str(raw).ok().map(StructuredPayload::Plan),
            MessageKind::Resources => serde_json::from_str(raw)
                .ok()
                .map(StructuredPayload::Resources),
            _ => None,
        });
        Self {
            role,
            body: stored.message.clone(),
            kind,
            payload,
        }
    }
}

/// Ordered message history for one conversation.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole history, e.g. on session switch.
    pub fn replace_from_history(&mut self, stored: &[StoredMessage]) {
        self.messages = stored.iter().map(Message::from).collect();
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Per-turn fold state: which message is open for streaming appends and
/// the ephemeral progress line.
///
/// One `Reducer` lives for exactly one stream; the engine creates a
/// fresh one per send.
#[derive(Debug, Default)]
pub struct Reducer {
    open: Option<usize>,
    status: Option<String>,
}

impl Reducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent `status` text, shown as a progress indicator.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Apply one event to the transcript, in arrival order.
    ///
    /// Returns `true` if the transcript itself changed; status-only
    /// events return `false` so callers can publish change notifications
    /// accurately.
    pub fn fold(&mut self, transcript: &mut Transcript, event: StreamEvent) -> bool {
        match event {
            StreamEvent::Status { text } => {
                self.status = Some(text);
                false
            }
            StreamEvent::ChatStart => {
                // Idempotent: a duplicate start while a message is open
                // appends nothing.
                if self.open.is_none() {
                    transcript.push(Message::agent());
                    self.open = Some(transcript.len() - 1);
                    return true;
                }
                false
            }
            StreamEvent::ChatChunk { text } => {
                // A chunk arriving before any start synthesizes the start
                // implicitly, so out-of-order streams stay renderable.
                let idx = self.ensure_open(transcript);
                transcript.messages[idx].body.push_str(&text);
                true
            }
            StreamEvent::Plan { content } => {
                self.attach(transcript, MessageKind::Plan, StructuredPayload::Plan(content))
            }
            StreamEvent::Resources { content } => self.attach(
                transcript,
                MessageKind::Resources,
                StructuredPayload::Resources(content),
            ),
            StreamEvent::ChatEnd { full_text } => {
                // The server's full text is authoritative over the
                // accumulated deltas; either way the message closes.
                match self.open.take() {
                    Some(idx) => match full_text {
                        Some(text) => {
                            transcript.messages[idx].body = text;
                            true
                        }
                        None => false,
                    },
                    None => false,
                }
            }
            StreamEvent::Error { text } => {
                // Always a new entry; an in-progress message is neither
                // replaced nor cancelled.
                transcript.push(Message::error(text));
                true
            }
            StreamEvent::Unknown => false,
        }
    }

    fn ensure_open(&mut self, transcript: &mut Transcript) -> usize {
        match self.open {
            Some(idx) => idx,
            None => {
                transcript.push(Message::agent());
                let idx = transcript.len() - 1;
                self.open = Some(idx);
                idx
            }
        }
    }

    fn attach(
        &mut self,
        transcript: &mut Transcript,
        kind: MessageKind,
        payload: StructuredPayload,
    ) -> bool {
        let trailing_agent = transcript
            .last()
            .is_some_and(|m| m.role == Role::Agent)
            .then(|| transcript.len() - 1);
        match self.open.or(trailing_agent) {
            Some(idx) => {
                let message = &mut transcript.messages[idx];
                message.kind = kind;
                message.payload = Some(payload);
                true
            }
            None => {
                debug!("dropping structured payload with no agent message to attach to");
                false
            }
        }
    }
}
