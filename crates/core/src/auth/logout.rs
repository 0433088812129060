//! Forced logout
//!
//! Runs when the server has rejected both the access and the refresh token.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::ports::SessionStore;

/// Destroys the local session and redirects to the login entry point
///
/// Concurrent invocations collapse into one sign-out; later sequential calls
/// are harmless because [`SessionStore::sign_out`] is idempotent.
pub struct ForcedLogout {
    sessions: Arc<dyn SessionStore>,
    login_path: String,
    in_flight: AtomicBool,
    executed: AtomicUsize,
}

impl ForcedLogout {
    /// Sign-outs go through `sessions` and redirect to `login_path`
    pub fn new(sessions: Arc<dyn SessionStore>, login_path: impl Into<String>) -> Self {
        Self {
            sessions,
            login_path: login_path.into(),
            in_flight: AtomicBool::new(false),
            executed: AtomicUsize::new(0),
        }
    }

    /// Tear the session down. Failures of the store are logged, not returned:
    /// the caller is already on an error path.
    pub async fn execute(&self, reason: &str) {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!(reason, "forced logout already in progress");
            return;
        }
        let _guard = InFlightGuard(&self.in_flight);

        warn!(reason, login_path = %self.login_path, "forcing logout");
        self.executed.fetch_add(1, Ordering::SeqCst);

        if let Err(err) = self.sessions.sign_out(&self.login_path).await {
            error!(error = %err, "sign-out failed during forced logout");
        }
    }

    /// Redirect target after sign-out
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Number of sign-outs actually issued (collapsed calls excluded)
    pub fn executions(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

/// Clears the in-flight flag even if the logout future is dropped mid-way.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
