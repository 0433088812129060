//! Login, refresh, and logout against the backend auth endpoints
//!
//! These calls go straight to the transport: they never carry a bearer
//! token and never enter the 401 refresh path.

use std::sync::Arc;

use async_trait::async_trait;
use fleetdesk_core::auth::{RefreshError, SessionStore, TokenRefresher};
use fleetdesk_domain::{
    ApiConfig, AuthConfig, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
    RefreshedTokens, Session,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::errors::ApiError;
use super::response::{backend_error, decode_json};
use crate::http::HttpClient;

/// Auth endpoint client; doubles as the [`TokenRefresher`] for the
/// refresh coordinator
pub struct AuthApi {
    http: HttpClient,
    api: ApiConfig,
    auth: AuthConfig,
    sessions: Arc<dyn SessionStore>,
}

impl AuthApi {
    /// # Errors
    /// Returns `ApiError::Config` if the transport cannot be built.
    pub fn new(
        api: ApiConfig,
        auth: AuthConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .user_agent(api.user_agent.clone())
            .max_attempts(2)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Ok(Self { http, api, auth, sessions })
    }

    /// Exchange credentials for a session and store it
    ///
    /// # Errors
    /// `InvalidCredentials` on 401; otherwise the usual transport and
    /// backend errors.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Session, ApiError> {
        let response: LoginResponse =
            match self.post_json(&self.auth.login_endpoint, credentials).await {
                Err(ApiError::Backend { status: 401, .. }) => {
                    return Err(ApiError::InvalidCredentials)
                }
                other => other?,
            };

        let session = Session::from(response);
        self.sessions
            .store_session(session.clone())
            .await
            .map_err(|e| ApiError::Config(format!("Failed to store session: {}", e)))?;

        info!(user_id = session.user.id, "signed in");
        Ok(session)
    }

    /// User-initiated sign-out
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the session store fails.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.sessions
            .sign_out(&self.auth.login_path)
            .await
            .map_err(|e| ApiError::Config(format!("Failed to sign out: {}", e)))?;
        info!("signed out");
        Ok(())
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.api.url_for(endpoint);
        let timeout = self.api.timeout();
        debug!(url = %url, "POST auth request");

        let call = async {
            let request = self.http.request(reqwest::Method::POST, &url).json(body);
            let response = self.http.send(request).await.map_err(ApiError::from)?;

            if !response.status().is_success() {
                return Err(backend_error(response).await);
            }
            decode_json(response).await
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }
}

#[async_trait]
impl TokenRefresher for AuthApi {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let request = RefreshRequest { refresh_token: refresh_token.to_string() };

        match self.post_json::<_, RefreshResponse>(&self.auth.refresh_endpoint, &request).await {
            Ok(response) => Ok(response.into()),
            Err(ApiError::Backend { status, message })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Err(RefreshError::Rejected(message))
            }
            Err(err) => Err(RefreshError::Transport(err.to_string())),
        }
    }
}
