//! Process-local session store

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fleetdesk_domain::{FleetDeskError, RefreshedTokens, Result, Session};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::ports::SessionStore;

/// In-memory [`SessionStore`]
///
/// Keeps the session behind a `RwLock` and remembers where the last sign-out
/// redirected to, so a host without a navigation layer can act on it.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session: RwLock<Option<Session>>,
    redirect: RwLock<Option<String>>,
    sign_outs: AtomicUsize,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self { session: RwLock::new(Some(session)), ..Self::default() }
    }

    /// Redirect target recorded by the most recent sign-out
    pub async fn last_redirect(&self) -> Option<String> {
        self.redirect.read().await.clone()
    }

    /// Number of sign-outs that actually destroyed a session
    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn store_session(&self, session: Session) -> Result<()> {
        info!(user_id = session.user.id, "session stored");
        *self.session.write().await = Some(session);
        *self.redirect.write().await = None;
        Ok(())
    }

    async fn update_tokens(&self, tokens: RefreshedTokens) -> Result<()> {
        let mut guard = self.session.write().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| FleetDeskError::Auth("no active session to update".to_string()))?;
        session.apply_refresh(tokens);
        debug!(user_id = session.user.id, "session tokens replaced");
        Ok(())
    }

    async fn sign_out(&self, redirect_to: &str) -> Result<()> {
        let previous = self.session.write().await.take();
        *self.redirect.write().await = Some(redirect_to.to_string());

        if let Some(session) = previous {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            info!(user_id = session.user.id, redirect_to, "session destroyed");
        } else {
            debug!(redirect_to, "sign-out without an active session");
        }
        Ok(())
    }
}
