//! Logging setup and client metrics
//!
//! Logging goes through `tracing`; [`init_tracing`] installs a
//! `tracing-subscriber` registry filtered by `RUST_LOG` when set, else by
//! the configured level.

pub mod metrics;

use fleetdesk_domain::{FleetDeskError, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub use metrics::{ClientMetrics, MetricsSnapshot};

/// Install the global tracing subscriber
///
/// # Errors
/// Returns `FleetDeskError::Config` if the level directive is invalid or a
/// global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), FleetDeskError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            FleetDeskError::Config(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| FleetDeskError::Config(format!("Failed to install subscriber: {}", e)))
}
