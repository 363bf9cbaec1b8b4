//! Wire types shared with the study-planner backend.
//!
//! These mirror the backend's response models field for field; anything
//! the server may omit is `Option` or defaulted so older servers keep
//! deserializing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::SessionId;

/// One conversation, as listed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted chat message, as returned by the history endpoint.
///
/// `role` and `msg_type` stay raw strings here; the transcript layer maps
/// them onto its own enums and tolerates values it does not know.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub message: String,
    pub role: String,
    #[serde(default = "default_msg_type")]
    pub msg_type: String,
    /// JSON-encoded structured payload for `plan`/`resources` messages.
    #[serde(default)]
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn default_msg_type() -> String {
    "chat".to_string()
}

/// A learning goal. At most one goal references a given session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub text: String,
    #[serde(default)]
    pub deadline: Option<String>,
    pub status: String,
    pub progress: i32,
    pub total_tasks: i32,
    pub completed_tasks: i32,
}

/// Category of a server-side notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DailyTask,
    Reminder,
    System,
    #[serde(other)]
    Other,
}

/// A notification row from the backend, surfaced by the poller.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}
