//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the process environment when one exists
//! 2. Attempts to build the config from environment variables
//! 3. If `FLEETDESK_API_URL` is missing, falls back to a config file
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `FLEETDESK_API_URL`: Server-side API base URL (required)
//! - `FLEETDESK_PUBLIC_API_URL`: Client-side API base URL
//! - `FLEETDESK_EXECUTION_CONTEXT`: `server` or `client`
//! - `FLEETDESK_API_TIMEOUT_SECS`: Per-attempt deadline in seconds
//! - `FLEETDESK_USER_AGENT`: User agent sent with every request
//! - `FLEETDESK_AUTH_LOGIN_ENDPOINT`: Login endpoint path
//! - `FLEETDESK_AUTH_REFRESH_ENDPOINT`: Refresh endpoint path
//! - `FLEETDESK_LOGIN_PATH`: Where a forced logout redirects
//! - `FLEETDESK_LOG_LEVEL`: Tracing filter directive
//! - `FLEETDESK_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./fleetdesk.json` or `./fleetdesk.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use fleetdesk_domain::{
    ApiConfig, AuthConfig, Config, ExecutionContext, FleetDeskError, LoggingConfig, Result,
};
use url::Url;

const ENV_API_URL: &str = "FLEETDESK_API_URL";

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `FleetDeskError::Config` if:
/// - An environment variable is present but invalid
/// - No API URL is set and no config file can be loaded
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) if std::env::var_os(ENV_API_URL).is_none() => {
            tracing::debug!(error = ?e, "API URL not in environment, trying file");
            load_from_file(None)
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from environment variables
///
/// Only `FLEETDESK_API_URL` is required; everything else has a default.
///
/// # Errors
/// Returns `FleetDeskError::Config` if the API URL is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let server_base_url = validate_url(ENV_API_URL, &env_var(ENV_API_URL)?)?;
    let public_base_url = match env_opt("FLEETDESK_PUBLIC_API_URL") {
        Some(url) => Some(validate_url("FLEETDESK_PUBLIC_API_URL", &url)?),
        None => None,
    };
    let context = match env_opt("FLEETDESK_EXECUTION_CONTEXT") {
        Some(value) => value.parse::<ExecutionContext>().map_err(|e| {
            FleetDeskError::Config(format!("Invalid FLEETDESK_EXECUTION_CONTEXT: {}", e))
        })?,
        None => defaults.api.context,
    };
    let timeout_secs = match env_opt("FLEETDESK_API_TIMEOUT_SECS") {
        Some(value) => parse_timeout(&value)?,
        None => defaults.api.timeout_secs,
    };

    Ok(Config {
        api: ApiConfig {
            server_base_url,
            public_base_url,
            context,
            timeout_secs,
            user_agent: env_opt("FLEETDESK_USER_AGENT").unwrap_or(defaults.api.user_agent),
        },
        auth: AuthConfig {
            login_endpoint: env_opt("FLEETDESK_AUTH_LOGIN_ENDPOINT")
                .unwrap_or(defaults.auth.login_endpoint),
            refresh_endpoint: env_opt("FLEETDESK_AUTH_REFRESH_ENDPOINT")
                .unwrap_or(defaults.auth.refresh_endpoint),
            login_path: env_opt("FLEETDESK_LOGIN_PATH").unwrap_or(defaults.auth.login_path),
        },
        logging: LoggingConfig {
            level: env_opt("FLEETDESK_LOG_LEVEL").unwrap_or(defaults.logging.level),
            json: env_bool("FLEETDESK_LOG_JSON", defaults.logging.json),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is picked by
/// file extension.
///
/// # Errors
/// Returns `FleetDeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or a URL in it is malformed
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FleetDeskError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FleetDeskError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FleetDeskError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    validate_url("api.server_base_url", &config.api.server_base_url)?;
    if let Some(public) = &config.api.public_base_url {
        validate_url("api.public_base_url", public)?;
    }
    if config.api.timeout_secs == 0 {
        return Err(FleetDeskError::Config("api.timeout_secs must be greater than 0".into()));
    }
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FleetDeskError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FleetDeskError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(FleetDeskError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard paths for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("fleetdesk.json"),
        dir.join("fleetdesk.toml"),
    ]
}

/// Base URLs must be absolute http(s) URLs
fn validate_url(name: &str, value: &str) -> Result<String> {
    let url = Url::parse(value)
        .map_err(|e| FleetDeskError::Config(format!("Invalid URL in {}: {}", name, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(value.trim_end_matches('/').to_string()),
        other => Err(FleetDeskError::Config(format!(
            "Unsupported URL scheme '{}' in {}",
            other, name
        ))),
    }
}

fn parse_timeout(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(FleetDeskError::Config("Timeout must be greater than 0".into())),
        Ok(secs) => Ok(secs),
        Err(e) => Err(FleetDeskError::Config(format!("Invalid timeout: {}", e))),
    }
}

/// Get required environment variable
///
/// # Errors
/// Returns `FleetDeskError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FleetDeskError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional variable; blank counts as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
