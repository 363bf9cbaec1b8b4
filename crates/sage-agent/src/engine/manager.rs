//! Engine state and session management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use sage_common::{ChatSession, EventBus, Goal, SessionId, StateEvent};

use crate::transcript::Transcript;
use crate::{EngineError, StudyBackend};

/// Client-side session/chat state machine.
///
/// Owns the cached session list, the active-session pointer, the
/// transcript of the conversation being viewed, and the goal linked to
/// it. Publishes a [`StateEvent`] on its bus after every observable
/// change; subscribers re-read the state they render.
pub struct ChatEngine {
    pub(super) backend: Arc<dyn StudyBackend>,
    pub(super) bus: EventBus,
    pub(super) sessions: Vec<ChatSession>,
    pub(super) active: Option<SessionId>,
    pub(super) transcript: Transcript,
    pub(super) goal: Option<Goal>,
    pub(super) status: Option<String>,
    pub(super) sending: Arc<AtomicBool>,
}

impl ChatEngine {
    pub fn new(backend: Arc<dyn StudyBackend>) -> Self {
        Self {
            backend,
            bus: EventBus::new(64),
            sessions: Vec::new(),
            active: None,
            transcript: Transcript::new(),
            goal: None,
            status: None,
            sending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    /// The ephemeral progress line, present only while a turn runs.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Relaxed)
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.bus.subscribe()
    }

    /// Fetch and cache the session list. Never changes the selection;
    /// which session is viewed stays under the caller's control.
    pub async fn refresh_sessions(&mut self) -> Result<&[ChatSession], EngineError> {
        let sessions = self.backend.list_sessions().await?;
        self.sessions = sessions;
        self.bus.publish(StateEvent::SessionsChanged);
        Ok(&self.sessions)
    }

    /// Make `id` the active session and load its history and linked
    /// goal. The pointer moves before the fetches, matching what a view
    /// highlights immediately on click.
    pub async fn select_session(&mut self, id: SessionId) -> Result<(), EngineError> {
        self.active = Some(id);
        self.bus.publish(StateEvent::SessionSelected(Some(id)));

        let history = self.backend.history(id).await?;
        self.transcript.replace_from_history(&history);
        self.bus.publish(StateEvent::TranscriptChanged);

        self.refresh_goal().await;
        Ok(())
    }

    /// Reset to a fresh, unsaved conversation.
    pub fn new_chat(&mut self) {
        self.active = None;
        self.transcript.clear();
        self.goal = None;
        self.bus.publish(StateEvent::SessionSelected(None));
        self.bus.publish(StateEvent::TranscriptChanged);
    }

    /// Create a session on the backend and make it active with an empty
    /// transcript.
    pub async fn create_session(&mut self, title: &str) -> Result<SessionId, EngineError> {
        let session = self.backend.create_session(title).await?;
        let id = session.id;
        self.sessions.insert(0, session);
        self.active = Some(id);
        self.transcript.clear();
        self.goal = None;
        self.bus.publish(StateEvent::SessionsChanged);
        self.bus.publish(StateEvent::SessionSelected(Some(id)));
        Ok(id)
    }

    /// Rename a session, updating the cached list on success. Blank
    /// titles are ignored.
    pub async fn rename_session(&mut self, id: SessionId, title: &str) -> Result<(), EngineError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(());
        }
        let updated = self.backend.rename_session(id, title).await?;
        if let Some(entry) = self.sessions.iter_mut().find(|s| s.id == id) {
            entry.title = updated.title;
        }
        self.bus.publish(StateEvent::SessionsChanged);
        Ok(())
    }

    /// Delete a session. Deleting the active one selects the first
    /// remaining session, or clears to an empty idle state when none
    /// are left.
    pub async fn delete_session(&mut self, id: SessionId) -> Result<(), EngineError> {
        self.backend.delete_session(id).await?;
        self.sessions.retain(|s| s.id != id);
        self.bus.publish(StateEvent::SessionsChanged);

        if self.active == Some(id) {
            match self.sessions.first().map(|s| s.id) {
                Some(next) => {
                    if let Err(e) = self.select_session(next).await {
                        warn!("failed to load session {next} after delete: {e}");
                    }
                }
                None => self.new_chat(),
            }
        }
        Ok(())
    }

    /// Refresh the goal linked to the active session. A session without
    /// a goal is a valid state, not an error; fetch failures are logged
    /// and leave the current value.
    pub(super) async fn refresh_goal(&mut self) {
        let Some(active) = self.active else {
            self.goal = None;
            return;
        };
        match self.backend.list_goals().await {
            Ok(goals) => {
                self.goal = goals.into_iter().find(|g| g.session_id == Some(active));
                self.bus.publish(StateEvent::GoalChanged);
            }
            Err(e) => warn!("failed to fetch goal for session {active}: {e}"),
        }
    }
}
