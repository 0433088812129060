//! Token refresh errors

use thiserror::Error;

/// Why a fresh access token could not be obtained
///
/// `Clone` because a single failure is delivered to every waiter queued on
/// the same refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("No active session")]
    NoSession,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Refresh token rejected: {0}")]
    Rejected(String),

    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Session store failure: {0}")]
    Store(String),

    #[error("Token refresh abandoned before completion")]
    Abandoned,
}
