//! Authentication API client methods

use super::{ApiClient, ApiRequest, ClientError};
use crate::types::{AuthResponse, LoginRequest, RegisterRequest};
use cadence_core::{EndReason, Session};
use tracing::{info, warn};

impl ApiClient {
    /// Log in and start a session.
    ///
    /// A 401 here means bad credentials and is returned as-is; it never
    /// triggers a token refresh.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self
            .execute_public(ApiRequest::post("/auth/login").json(request)?)
            .await?;
        self.session.begin(Session::from(response.clone())).await?;
        Ok(response)
    }

    /// Register a new account and start a session
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self
            .execute_public(ApiRequest::post("/auth/register").json(request)?)
            .await?;
        self.session.begin(Session::from(response.clone())).await?;
        Ok(response)
    }

    /// Log out.
    ///
    /// The server call is best-effort: the local session is ended whatever the
    /// server answers, and only a failure to clear local state is returned.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(token) = self.session.access_token().await? {
            let result = self
                .dispatch(&ApiRequest::post("/auth/logout"), Some(&token))
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    info!("Server session revoked");
                }
                Ok(response) => {
                    warn!(status = %response.status(), "Server rejected logout, clearing local session anyway");
                }
                Err(e) => warn!("Logout request failed, clearing local session anyway: {e}"),
            }
        }

        self.session.end(EndReason::LoggedOut).await?;
        Ok(())
    }
}
