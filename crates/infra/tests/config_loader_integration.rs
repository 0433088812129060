//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from the
//! environment and from files.

use std::io::Write;
use std::sync::Mutex;

use fleetdesk_domain::{ExecutionContext, FleetDeskError};
use fleetdesk_infra::config;
use once_cell::sync::Lazy;
use tempfile::{NamedTempFile, TempDir};

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "api": {
            "server_base_url": "http://fleet-api.internal:3001/",
            "public_base_url": "https://api.fleetdesk.example",
            "context": "server",
            "timeout_secs": 20,
            "user_agent": "fleetdesk-tests"
        },
        "auth": {
            "login_endpoint": "/v2/auth/login",
            "refresh_endpoint": "/v2/auth/refresh",
            "login_path": "/entrar"
        },
        "logging": { "level": "fleetdesk_infra=debug", "json": true }
    }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let config = config::load_from_file(Some(path.clone())).expect("json config");

    assert_eq!(config.api.base_url(), "http://fleet-api.internal:3001");
    assert_eq!(config.api.url_for("/employees/5"), "http://fleet-api.internal:3001/employees/5");
    assert_eq!(config.api.timeout_secs, 20);
    assert_eq!(config.api.user_agent, "fleetdesk-tests");
    assert_eq!(config.auth.refresh_endpoint, "/v2/auth/refresh");
    assert_eq!(config.auth.login_path, "/entrar");
    assert!(config.logging.json);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
[api]
server_base_url = "http://fleet-api.internal:3001"
public_base_url = "https://api.fleetdesk.example"
context = "client"
"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("toml");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let config = config::load_from_file(Some(path.clone())).expect("toml config");

    assert_eq!(config.api.context, ExecutionContext::Client);
    assert_eq!(config.api.base_url(), "https://api.fleetdesk.example");
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.auth.login_path, "/login");
    assert_eq!(config.logging.level, "info");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_api_section_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("fleetdesk.json");
    std::fs::write(&path, r#"{ "logging": { "level": "warn" } }"#).expect("write config");

    let err = config::load_from_file(Some(path)).unwrap_err();
    assert!(matches!(err, FleetDeskError::Config(msg) if msg.contains("Invalid JSON")));
}

#[test]
fn test_environment_takes_precedence() {
    let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

    std::env::set_var("FLEETDESK_API_URL", "https://env.fleetdesk.example");
    std::env::set_var("FLEETDESK_EXECUTION_CONTEXT", "server");
    std::env::set_var("FLEETDESK_API_TIMEOUT_SECS", "30");

    let result = config::load();

    std::env::remove_var("FLEETDESK_API_URL");
    std::env::remove_var("FLEETDESK_EXECUTION_CONTEXT");
    std::env::remove_var("FLEETDESK_API_TIMEOUT_SECS");

    let config = result.expect("config from env");
    assert_eq!(config.api.base_url(), "https://env.fleetdesk.example");
    assert_eq!(config.api.timeout_secs, 30);
}

#[test]
fn test_invalid_environment_is_not_masked_by_file_fallback() {
    let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

    std::env::set_var("FLEETDESK_API_URL", "https://env.fleetdesk.example");
    std::env::set_var("FLEETDESK_API_TIMEOUT_SECS", "soon");

    let result = config::load();

    std::env::remove_var("FLEETDESK_API_URL");
    std::env::remove_var("FLEETDESK_API_TIMEOUT_SECS");

    assert!(matches!(result, Err(FleetDeskError::Config(msg)) if msg.contains("timeout")));
}
