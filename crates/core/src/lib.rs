//! # FleetDesk Core
//!
//! Pure session logic - no HTTP or platform code.
//!
//! This crate contains:
//! - Port interfaces for session storage and token refresh
//! - The single-flight token refresh coordinator
//! - The forced logout action
//!
//! ## Architecture Principles
//! - Only depends on `fleetdesk-domain`
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod auth;

pub use auth::{
    ForcedLogout, InMemorySessionStore, RefreshCoordinator, RefreshError, SessionStore,
    TokenRefresher,
};
