//! Session storage and lifecycle
//!
//! [`SessionStore`] is the persistence seam (memory for tests and throwaway
//! runs, a JSON file for the CLI). [`SessionManager`] pairs a store with the
//! [`SessionEvents`] bus so every write is announced exactly once.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::events::{EndReason, SessionEvent, SessionEvents};
use crate::types::{Role, Session};
use crate::CoreResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the persisted session, `None` when signed out
    async fn load(&self) -> CoreResult<Option<Session>>;

    /// Persist `session`, replacing any previous one
    async fn save(&self, session: &Session) -> CoreResult<()>;

    /// Remove the persisted session
    async fn clear(&self) -> CoreResult<()>;
}

/// Process-wide handle to the active session
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            events: SessionEvents::new(),
        }
    }

    /// Manager backed by a [`MemorySessionStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn current(&self) -> CoreResult<Option<Session>> {
        self.store.load().await
    }

    pub async fn access_token(&self) -> CoreResult<Option<String>> {
        Ok(self.store.load().await?.map(|session| session.access_token))
    }

    pub async fn is_logged_in(&self) -> CoreResult<bool> {
        Ok(self.store.load().await?.is_some())
    }

    /// Whether a session exists and its user holds one of `roles`
    pub async fn has_role(&self, roles: &[Role]) -> CoreResult<bool> {
        Ok(self
            .store
            .load()
            .await?
            .is_some_and(|session| session.has_role(roles)))
    }

    /// Store a session obtained from login or registration
    pub async fn begin(&self, session: Session) -> CoreResult<()> {
        self.store.save(&session).await?;
        info!(user_id = %session.user.id, role = %session.user.role, "Session started");
        self.events.publish(SessionEvent::SignedIn {
            user_id: session.user.id,
        });
        Ok(())
    }

    /// Overwrite the session with one minted by a refresh
    pub async fn replace(&self, session: Session) -> CoreResult<()> {
        self.store.save(&session).await?;
        info!(user_id = %session.user.id, "Session refreshed");
        self.events.publish(SessionEvent::Refreshed {
            user_id: session.user.id,
        });
        Ok(())
    }

    /// Clear the stored session and announce why.
    ///
    /// The event is published even if clearing the store fails, so listeners
    /// always learn that the session is gone.
    pub async fn end(&self, reason: EndReason) -> CoreResult<()> {
        let cleared = self.store.clear().await;
        info!(?reason, "Session ended");
        self.events.publish(SessionEvent::Ended { reason });
        cleared
    }
}
