//! Session lifecycle notifications
//!
//! Any number of listeners (the CLI shell, background tasks, tests) can
//! subscribe. A forced `Ended` event is how the rest of the program learns
//! that the user has to sign in again.

use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The user logged out
    LoggedOut,
    /// The refresh exchange was rejected; the session cannot be recovered
    RefreshFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_id: String },
    Refreshed { user_id: String },
    Ended { reason: EndReason },
}

impl SessionEvent {
    /// True for an `Ended` event not caused by an explicit logout
    pub fn is_forced_end(&self) -> bool {
        matches!(
            self,
            Self::Ended {
                reason: EndReason::RefreshFailed
            }
        )
    }
}

/// Broadcast bus for [`SessionEvent`]s
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, event: SessionEvent) {
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::trace!(delivered, "Published session event");
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
