//! Port interfaces for session handling

use async_trait::async_trait;
use fleetdesk_domain::{RefreshedTokens, Result, Session};

use super::errors::RefreshError;

/// Storage for the current user session
///
/// The host application owns the session; the HTTP layer reads it on every
/// request and only mutates it through refresh and sign-out.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session, if any
    async fn current_session(&self) -> Option<Session>;

    /// Install a new session (after login)
    async fn store_session(&self, session: Session) -> Result<()>;

    /// Replace the tokens of the current session
    ///
    /// # Errors
    /// Returns `FleetDeskError::Auth` when there is no session to update.
    async fn update_tokens(&self, tokens: RefreshedTokens) -> Result<()>;

    /// Destroy the session and send the user to `redirect_to`
    ///
    /// Must be idempotent: signing out without a session is not an error.
    async fn sign_out(&self, redirect_to: &str) -> Result<()>;
}

/// Exchanges a refresh token for new tokens
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Call the refresh endpoint with `refresh_token`
    ///
    /// # Errors
    /// `Rejected` when the server refuses the token, `Transport` when no
    /// verdict was received.
    async fn refresh(&self, refresh_token: &str) -> std::result::Result<RefreshedTokens, RefreshError>;
}
