//! Chat engine for the sage study planner.
//!
//! Consumes the backend's streamed chat responses (newline-delimited
//! JSON records), folds them into an in-memory transcript, and keeps
//! session and goal state consistent once a stream closes:
//! - Frame reassembly across arbitrary fragment boundaries
//! - A small tagged-event protocol, tolerant of unknown event kinds
//! - Transcript mutation rules (streaming deltas, structured payloads)
//! - Session lifecycle: create-on-first-message, select, rename, delete,
//!   post-stream reconciliation of the session list and linked goal
//! - A background poller for server-side notifications

pub mod api;
pub mod engine;
pub mod event;
pub mod notifications;
pub mod streaming;
pub mod transcript;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use sage_common::{ApiError, ChatSession, Goal, NotificationRecord, SessionId, StoredMessage};

pub use api::{ApiClient, ApiConfig};
pub use engine::ChatEngine;
pub use event::{PlanContent, ResourceContent, StreamEvent};
pub use notifications::NotificationPoller;
pub use streaming::{drain_frames, FrameDecoder, StreamEnd};
pub use transcript::{Message, MessageKind, Reducer, Role, StructuredPayload, Transcript};

/// Raw body fragments of a streamed chat response, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<Vec<u8>, ApiError>>;

/// The backend the engine talks to.
///
/// `ApiClient` implements this over HTTP; tests substitute scripted
/// in-memory doubles.
#[async_trait]
pub trait StudyBackend: Send + Sync {
    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ApiError>;

    async fn create_session(&self, title: &str) -> Result<ChatSession, ApiError>;

    async fn rename_session(&self, id: SessionId, title: &str) -> Result<ChatSession, ApiError>;

    async fn delete_session(&self, id: SessionId) -> Result<(), ApiError>;

    async fn history(&self, id: SessionId) -> Result<Vec<StoredMessage>, ApiError>;

    async fn list_goals(&self) -> Result<Vec<Goal>, ApiError>;

    async fn list_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError>;

    async fn mark_notification_read(&self, id: i64) -> Result<(), ApiError>;

    async fn delete_notification(&self, id: i64) -> Result<(), ApiError>;

    /// Open a streaming chat turn. The returned stream yields raw body
    /// fragments that reassemble into newline-delimited JSON records.
    async fn send_message(
        &self,
        session: SessionId,
        message: &str,
    ) -> Result<FragmentStream, ApiError>;
}

/// Engine-level rejections. These never reach the transcript; failures
/// that belong in the conversation surface as error messages instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("a send is already in progress")]
    Busy,

    #[error(transparent)]
    Api(#[from] ApiError),
}
