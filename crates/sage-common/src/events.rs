use tokio::sync::broadcast;

use crate::id::SessionId;

/// State-change notifications published by the chat engine.
///
/// Payloads are deliberately small; subscribers re-read the engine state
/// they care about instead of receiving snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// The cached session list was replaced.
    SessionsChanged,
    /// The active-session pointer moved (possibly to nothing).
    SessionSelected(Option<SessionId>),
    /// The transcript gained or mutated a message.
    TranscriptChanged,
    /// The ephemeral progress line changed.
    StatusChanged(Option<String>),
    /// The goal linked to the active session was refreshed.
    GoalChanged,
    /// A chat turn finished (stream closed, reconciliation done).
    TurnFinished,
}

pub struct EventBus {
    sender: broadcast::Sender<StateEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: StateEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(StateEvent::SessionsChanged);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, StateEvent::SessionsChanged);
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(StateEvent::TurnFinished);

        assert_eq!(rx1.recv().await.unwrap(), StateEvent::TurnFinished);
        assert_eq!(rx2.recv().await.unwrap(), StateEvent::TurnFinished);
    }

    #[tokio::test]
    async fn selection_events_carry_pointer() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(StateEvent::SessionSelected(Some(SessionId(5))));
        bus.publish(StateEvent::SessionSelected(None));

        assert_eq!(
            rx.recv().await.unwrap(),
            StateEvent::SessionSelected(Some(SessionId(5)))
        );
        assert_eq!(rx.recv().await.unwrap(), StateEvent::SessionSelected(None));
    }

    #[test]
    fn publish_returns_zero_with_no_subscribers() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(StateEvent::TranscriptChanged), 0);
    }

    #[tokio::test]
    async fn publish_returns_subscriber_count() {
        let bus = EventBus::new(16);
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();

        assert_eq!(bus.publish(StateEvent::GoalChanged), 2);
    }
}
