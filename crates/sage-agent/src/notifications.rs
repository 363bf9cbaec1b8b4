//! Background polling for server-side notifications.
//!
//! Kept fully independent of the chat engine: reminders arrive on their
//! own channel and cadence whether or not a conversation is open.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sage_common::NotificationRecord;

use crate::StudyBackend;

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Periodically fetches the notification list and forwards each batch.
pub struct NotificationPoller {
    backend: Arc<dyn StudyBackend>,
    interval: Duration,
}

impl NotificationPoller {
    pub fn new(backend: Arc<dyn StudyBackend>) -> Self {
        Self {
            backend,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Spawn the polling task. The first fetch happens immediately, then
    /// on every interval tick. Batches arrive on the returned receiver;
    /// the task stops when `cancel` fires or the receiver is dropped.
    /// Fetch failures are logged and the next tick tries again.
    pub fn spawn(
        self,
        cancel: CancellationToken,
    ) -> (JoinHandle<()>, mpsc::Receiver<Vec<NotificationRecord>>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("notification poller stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match self.backend.list_notifications().await {
                            Ok(batch) => {
                                if tx.send(batch).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("notification poll failed: {e}"),
                        }
                    }
                }
            }
        });
        (handle, rx)
    }
}
