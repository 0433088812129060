//! Session lifecycle: storage port, token refresh, forced logout
//!
//! Components:
//! - [`SessionStore`] / [`TokenRefresher`] - ports implemented by the host
//!   application and by the HTTP layer
//! - [`RefreshCoordinator`] - collapses concurrent refresh requests into one
//!   network call
//! - [`ForcedLogout`] - tears the session down when both tokens are dead
//! - [`InMemorySessionStore`] - process-local `SessionStore`

pub mod errors;
pub mod logout;
pub mod memory;
pub mod ports;
pub mod refresh;

pub use errors::RefreshError;
pub use logout::ForcedLogout;
pub use memory::InMemorySessionStore;
pub use ports::{SessionStore, TokenRefresher};
pub use refresh::RefreshCoordinator;
