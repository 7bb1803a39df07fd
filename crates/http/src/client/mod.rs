//! Cadence API client
//!
//! Every request goes out with the current access token attached. A 401 on
//! a request that has not been replayed yet triggers one coalesced token
//! refresh and a single replay; everything else is returned to the caller
//! as-is.

pub mod auth;
pub mod error;
pub mod playlists;
mod refresh;
pub mod request;
pub mod tracks;
pub mod users;

pub use error::ClientError;
pub use request::{ApiRequest, FormField, RequestBody};

use crate::types::AuthResponse;
use cadence_core::{ApiSettings, Session, SessionManager};
use refresh::{RefreshCoordinator, Trigger};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use error::error_message;

pub(crate) const REFRESH_PATH: &str = "/auth/refresh";

/// Music library API client
///
/// Cheap to clone; clones share the HTTP connection pool, the cookie jar,
/// the session and the refresh state.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    base: Url,
    session: SessionManager,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a new client with an in-memory session
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session shared with this client
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Send a request, recovering once from an expired access token.
    ///
    /// The returned response may still carry an error status; see
    /// [`ApiClient::execute`] for the decoding variant.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response, ClientError> {
        let token = self.session.access_token().await?;
        let response = self.dispatch(request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(
            method = %request.method(),
            path = %request.path(),
            "Request rejected with 401, refreshing access token"
        );
        let fresh = self
            .refresh
            .fresh_token(Trigger::Rejected(token.as_deref()), || self.exchange())
            .await?;

        // Second and last attempt: whatever comes back goes to the caller
        self.dispatch(request, Some(&fresh)).await
    }

    /// Send a request and decode a JSON success body
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.send(&request).await?;
        decode(response).await
    }

    /// Send a request whose success body is irrelevant
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<(), ClientError> {
        let response = self.send(&request).await?;
        check(response).await.map(drop)
    }

    /// Send a request without a token and without 401 recovery
    pub(crate) async fn execute_public<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ClientError> {
        let response = self.dispatch(&request, None).await?;
        decode(response).await
    }

    /// Obtain a new access token now, sharing any refresh already in flight
    pub async fn refresh(&self) -> Result<Session, ClientError> {
        self.refresh
            .fresh_token(Trigger::Explicit, || self.exchange())
            .await?;
        self.session
            .current()
            .await?
            .ok_or_else(|| ClientError::SessionExpired("session was cleared".to_string()))
    }

    /// The refresh exchange itself: cookie only, never the expired bearer token
    fn exchange(&self) -> impl std::future::Future<Output = Result<Session, ClientError>> + Send + 'static {
        let client = self.clone();
        async move {
            let response: AuthResponse = client
                .execute_public(ApiRequest::post(REFRESH_PATH))
                .await?;
            Ok(Session::from(response))
        }
    }

    /// Absolute URL of a request under the base URL, without sending it
    pub(crate) fn url_for(&self, request: &ApiRequest) -> Result<String, ClientError> {
        Ok(request.url(&self.base)?.into())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ClientError> {
        debug!(
            method = %request.method(),
            path = %request.path(),
            authenticated = token.is_some(),
            "Sending API request"
        );
        let response = request
            .build(&self.client, &self.base, token)?
            .send()
            .await?;
        Ok(response)
    }
}

/// Turn an error status into a [`ClientError`], passing success through
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_status(status, error_message(status, &body)))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = check(response).await?;
    Ok(response.json().await?)
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<SessionManager>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Share an existing session; defaults to a fresh in-memory one
    pub fn session(mut self, session: SessionManager) -> Self {
        self.session = Some(session);
        self
    }

    /// Apply base URL, timeout and user agent from settings
    pub fn settings(mut self, settings: &ApiSettings) -> Self {
        self.base_url = Some(settings.base_url.clone());
        self.user_agent = Some(settings.user_agent.clone());
        self.timeout = (settings.timeout_secs > 0).then(|| Duration::from_secs(settings.timeout_secs));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let base = Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "base_url '{base_url}' cannot be used as a base"
            )));
        }

        // The refresh credential is an HttpOnly cookie, so keep a cookie jar
        let mut client_builder = ClientBuilder::new().cookie_store(true);

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder = client_builder.user_agent(
            self.user_agent
                .unwrap_or_else(|| concat!("cadence-client/", env!("CARGO_PKG_VERSION")).to_string()),
        );

        let client = client_builder.build()?;
        let session = self.session.unwrap_or_else(SessionManager::in_memory);

        Ok(ApiClient {
            client,
            base_url,
            base,
            refresh: RefreshCoordinator::new(session.clone()),
            session,
        })
    }
}
