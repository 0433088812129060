//! Configuration structures
//!
//! Loaded by `fleetdesk_infra::config` from environment variables or a
//! JSON/TOML file. Every section has defaults so partial files parse.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTH_LOGIN_ENDPOINT, AUTH_REFRESH_ENDPOINT, DEFAULT_LOGIN_PATH, DEFAULT_LOG_LEVEL,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use crate::impl_domain_status_conversions;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the client runs. The backend is reachable under a different base
/// URL from a server process than from an end-user client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    #[default]
    Server,
    Client,
}

impl_domain_status_conversions!(ExecutionContext {
    Server => "server",
    Client => "client",
});

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL used from server-side processes
    pub server_base_url: String,
    /// Base URL used from end-user clients; falls back to `server_base_url`
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub context: ExecutionContext,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    /// Config pointing at `base_url` for both contexts, other fields default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { server_base_url: base_url.into(), ..Self::default() }
    }

    /// Base URL for the configured execution context, without a trailing `/`.
    pub fn base_url(&self) -> &str {
        let url = match self.context {
            ExecutionContext::Server => self.server_base_url.as_str(),
            ExecutionContext::Client => {
                self.public_base_url.as_deref().unwrap_or(self.server_base_url.as_str())
            }
        };
        url.trim_end_matches('/')
    }

    /// Join a relative API path onto the base URL with exactly one `/`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server_base_url: "http://localhost:3001".to_string(),
            public_base_url: None,
            context: ExecutionContext::Server,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Auth endpoint and redirect settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,
    #[serde(default = "default_refresh_endpoint")]
    pub refresh_endpoint: String,
    /// Login entry point a forced logout redirects to
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_endpoint: default_login_endpoint(),
            refresh_endpoint: default_refresh_endpoint(),
            login_path: default_login_path(),
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `fleetdesk_infra=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_login_endpoint() -> String {
    AUTH_LOGIN_ENDPOINT.to_string()
}

fn default_refresh_endpoint() -> String {
    AUTH_REFRESH_ENDPOINT.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
