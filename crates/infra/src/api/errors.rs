//! API-specific error types
//!
//! Provides error classification for API operations.

use std::time::Duration;

use fleetdesk_domain::FleetDeskError;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Deadline exceeded
    Timeout,
    /// Session expired or credentials rejected
    Authentication,
    /// Non-2xx response other than 401
    Backend,
    /// Transport failure or undecodable response
    Network,
    /// Caller-side problem: cancellation, encoding, configuration
    Client,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Non-2xx response; `message` is the backend's own when it sent one
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Timeout(_) => ApiErrorCategory::Timeout,
            Self::SessionExpired | Self::InvalidCredentials => ApiErrorCategory::Authentication,
            Self::Backend { .. } => ApiErrorCategory::Backend,
            Self::Network(_) | Self::Decode(_) => ApiErrorCategory::Network,
            Self::Cancelled | Self::Encode(_) | Self::Config(_) => ApiErrorCategory::Client,
        }
    }

    /// HTTP status carried by backend errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether re-issuing the same request later may succeed
    ///
    /// The client never retries on its own beyond the single post-refresh
    /// attempt; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Backend { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Convert from the domain error to ApiError
impl From<FleetDeskError> for ApiError {
    fn from(err: FleetDeskError) -> Self {
        match err {
            FleetDeskError::Network(message) => Self::Network(message),
            FleetDeskError::Auth(_) => Self::SessionExpired,
            FleetDeskError::Config(message) => Self::Config(message),
            FleetDeskError::InvalidInput(message) => Self::Encode(message),
            FleetDeskError::NotFound(message) => Self::Backend { status: 404, message },
            FleetDeskError::Internal(message) => Self::Network(message),
        }
    }
}
