//! Access token refresh with request coalescing
//!
//! Any number of requests may be rejected with 401 at about the same time.
//! Only one of them starts the refresh exchange; the others park on a
//! oneshot channel until it settles, and every parked caller receives the
//! same outcome.
//!
//! The exchange runs on its own task. A caller that stops waiting cannot
//! leave the in-flight flag set or the other waiters hanging.

use super::ClientError;
use cadence_core::{EndReason, Session, SessionManager};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

/// What the parked callers receive: the new token, or why the refresh failed
type Outcome = Result<String, String>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

/// Why a fresh token is needed
#[derive(Debug, Clone, Copy)]
pub(crate) enum Trigger<'a> {
    /// A request carrying this token (or none) was rejected with 401
    Rejected(Option<&'a str>),
    /// The caller asked for a refresh outright
    Explicit,
}

#[derive(Clone)]
pub(crate) struct RefreshCoordinator {
    session: SessionManager,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(session: SessionManager) -> Self {
        Self {
            session,
            state: Arc::new(Mutex::new(RefreshState::default())),
        }
    }

    /// Obtain a usable access token, joining the in-flight refresh if there is
    /// one and starting one with `exchange` otherwise.
    ///
    /// `exchange` is only invoked when this caller starts the refresh.
    pub(crate) async fn fresh_token<F, Fut>(
        &self,
        trigger: Trigger<'_>,
        exchange: F,
    ) -> Result<String, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Session, ClientError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().await;

            if state.in_flight {
                debug!(waiters = state.waiters.len() + 1, "Waiting on in-flight token refresh");
                state.waiters.push(tx);
            } else {
                // Another caller may have refreshed between our send and now
                if let Trigger::Rejected(stale) = trigger {
                    if let Some(current) = self.session.access_token().await? {
                        if stale != Some(current.as_str()) {
                            debug!("Token already rotated, replaying with current token");
                            return Ok(current);
                        }
                    }
                }

                info!("Starting access token refresh");
                state.in_flight = true;
                state.waiters.push(tx);

                let coordinator = self.clone();
                let exchange = exchange();
                tokio::spawn(async move {
                    let outcome = exchange.await;
                    coordinator.settle(outcome).await;
                });
            }
        }

        match rx.await {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(reason)) => Err(ClientError::SessionExpired(reason)),
            Err(_) => Err(ClientError::SessionExpired(
                "token refresh was abandoned".to_string(),
            )),
        }
    }

    /// Persist or discard the session, then release every waiter with the
    /// same outcome and clear the in-flight flag in one critical section.
    async fn settle(&self, outcome: Result<Session, ClientError>) {
        let outcome: Outcome = match outcome {
            Ok(session) => {
                let token = session.access_token.clone();
                match self.session.replace(session).await {
                    Ok(()) => Ok(token),
                    Err(e) => Err(format!("could not store refreshed session: {e}")),
                }
            }
            Err(e) => Err(e.to_string()),
        };

        if let Err(reason) = &outcome {
            warn!("Token refresh failed, ending session: {reason}");
            if let Err(e) = self.session.end(EndReason::RefreshFailed).await {
                warn!("Failed to clear session after refresh failure: {e}");
            }
        }

        let mut state = self.state.lock().await;
        let waiters = std::mem::take(&mut state.waiters);
        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "Token refresh settled");
        for waiter in waiters {
            // A waiter whose caller went away is simply skipped
            let _ = waiter.send(outcome.clone());
        }
        state.in_flight = false;
    }
}
