//! Application constants
//!
//! Centralized location for the domain-level defaults used by the API client.

// Request policy
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "fleetdesk-client/0.1";

// Auth endpoints (relative to the API base URL)
pub const AUTH_LOGIN_ENDPOINT: &str = "/auth/login";
pub const AUTH_REFRESH_ENDPOINT: &str = "/auth/refresh";

// Where a forced logout sends the user
pub const DEFAULT_LOGIN_PATH: &str = "/login";

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Resource collections
pub const COMPANIES_PATH: &str = "/companies";
pub const EMPLOYEES_PATH: &str = "/employees";
pub const EQUIPMENT_PATH: &str = "/equipment";
pub const TIRES_PATH: &str = "/tires";
pub const DOCUMENTS_PATH: &str = "/documents";
