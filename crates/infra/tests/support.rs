//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use fleetdesk_core::auth::InMemorySessionStore;
use fleetdesk_domain::{ApiConfig, Config, Session, UserIdentity};
use fleetdesk_infra::FleetDesk;
use wiremock::MockServer;

pub fn jane() -> UserIdentity {
    UserIdentity {
        id: 5,
        email: "jane@example.com".to_string(),
        name: Some("Jane".to_string()),
        role: Some("dispatcher".to_string()),
    }
}

pub fn session(access: &str, refresh: Option<&str>) -> Session {
    Session::new(access, refresh.map(str::to_string), jane())
}

pub fn config_for(server: &MockServer, timeout_secs: u64) -> Config {
    let mut api = ApiConfig::new(server.uri());
    api.timeout_secs = timeout_secs;
    Config { api, ..Config::default() }
}

/// Client against `server` with `session` already signed in
pub fn fleet(server: &MockServer, session: Option<Session>) -> (FleetDesk, Arc<InMemorySessionStore>) {
    fleet_with_timeout(server, session, 10)
}

pub fn fleet_with_timeout(
    server: &MockServer,
    session: Option<Session>,
    timeout_secs: u64,
) -> (FleetDesk, Arc<InMemorySessionStore>) {
    let store = Arc::new(match session {
        Some(session) => InMemorySessionStore::with_session(session),
        None => InMemorySessionStore::new(),
    });
    let fleet = FleetDesk::new(&config_for(server, timeout_secs), store.clone())
        .expect("client should build");
    (fleet, store)
}
