//! Single-flight access token refresh
//!
//! State machine:
//! - `Idle`: the first caller holding a rejected token starts a refresh and
//!   moves the coordinator to `Refreshing`.
//! - `Refreshing`: later callers queue a waiter instead of calling the
//!   network.
//! - Settling: the new tokens are written to the [`SessionStore`] (or the
//!   session is torn down on failure) *before* the coordinator returns to
//!   `Idle`, then every waiter receives the same outcome.
//!
//! The refresh runs on its own task so a caller that gives up cannot leave
//! the coordinator stuck in `Refreshing`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, instrument, warn};

use super::errors::RefreshError;
use super::logout::ForcedLogout;
use super::ports::{SessionStore, TokenRefresher};

type RefreshOutcome = Result<String, RefreshError>;
type Waiter = oneshot::Sender<RefreshOutcome>;

enum RefreshState {
    Idle,
    Refreshing(Vec<Waiter>),
}

/// What a caller does after looking at the coordinator state
enum Admission {
    Wait(oneshot::Receiver<RefreshOutcome>),
    Ready(String),
    Reject(RefreshError),
}

struct Inner {
    sessions: Arc<dyn SessionStore>,
    refresher: Arc<dyn TokenRefresher>,
    logout: Arc<ForcedLogout>,
    state: Mutex<RefreshState>,
    refresh_calls: AtomicU64,
}

/// Collapses concurrent token refreshes into one network call
///
/// Cheap to clone; clones share state. Create one per session store and
/// hand it to every client that talks to the same backend.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// `logout` runs whenever a refresh cannot produce a token
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        refresher: Arc<dyn TokenRefresher>,
        logout: Arc<ForcedLogout>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions,
                refresher,
                logout,
                state: Mutex::new(RefreshState::Idle),
                refresh_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Obtain an access token newer than `rejected`
    ///
    /// If another caller already rotated the token, the stored one is
    /// returned without a network call. Otherwise this joins (or starts) the
    /// single in-flight refresh.
    ///
    /// # Errors
    /// Any failure has already torn the session down through
    /// [`ForcedLogout`] by the time it is returned.
    #[instrument(skip_all)]
    pub async fn fresh_token(&self, rejected: &str) -> RefreshOutcome {
        match self.admit(rejected).await {
            Admission::Wait(receiver) => receiver.await.unwrap_or(Err(RefreshError::Abandoned)),
            Admission::Ready(token) => Ok(token),
            Admission::Reject(err) => {
                self.inner.logout.execute(&err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Whether a refresh is currently in flight
    pub async fn is_refreshing(&self) -> bool {
        matches!(*self.inner.state.lock().await, RefreshState::Refreshing(_))
    }

    /// Number of refresh calls issued to the [`TokenRefresher`]
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    /// Logout shared with the API client's second-401 path
    pub fn forced_logout(&self) -> &Arc<ForcedLogout> {
        &self.inner.logout
    }

    async fn admit(&self, rejected: &str) -> Admission {
        let mut state = self.inner.state.lock().await;

        if let RefreshState::Refreshing(waiters) = &mut *state {
            let (sender, receiver) = oneshot::channel();
            waiters.push(sender);
            debug!(queued = waiters.len(), "joining in-flight token refresh");
            return Admission::Wait(receiver);
        }

        let Some(session) = self.inner.sessions.current_session().await else {
            return Admission::Reject(RefreshError::NoSession);
        };

        if session.access_token != rejected {
            debug!("access token already rotated, skipping refresh");
            return Admission::Ready(session.access_token);
        }

        let Some(refresh_token) = session.refresh_token else {
            return Admission::Reject(RefreshError::NoRefreshToken);
        };

        let (sender, receiver) = oneshot::channel();
        *state = RefreshState::Refreshing(vec![sender]);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_refresh(refresh_token).await });

        Admission::Wait(receiver)
    }
}

impl Inner {
    async fn run_refresh(self: Arc<Self>, refresh_token: String) {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        info!("refreshing access token");

        let outcome = match self.refresher.refresh(&refresh_token).await {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.sessions
                    .update_tokens(tokens)
                    .await
                    .map(|()| access_token)
                    .map_err(|err| RefreshError::Store(err.to_string()))
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            warn!(error = %err, "token refresh failed");
            self.logout.execute("token refresh failed").await;
        }

        let waiters = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing(waiters) => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };

        debug!(waiters = waiters.len(), success = outcome.is_ok(), "token refresh settled");
        for waiter in waiters {
            // A waiter whose caller went away is fine to skip.
            let _ = waiter.send(outcome.clone());
        }
    }
}
