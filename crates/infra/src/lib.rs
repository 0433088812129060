//! # FleetDesk Infrastructure
//!
//! I/O side of the FleetDesk client.
//!
//! This crate contains:
//! - The reqwest transport (`http`)
//! - The authenticated API client and auth endpoints (`api`)
//! - Typed resource services (`services`)
//! - Configuration loading, tracing setup, and client metrics
//!
//! ## Architecture
//! - Implements the ports defined in `fleetdesk-core`
//! - Depends on `fleetdesk-domain` and `fleetdesk-core`

pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod services;

/// Serializes unit tests that touch process environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: once_cell::sync::Lazy<std::sync::Mutex<()>> =
    once_cell::sync::Lazy::new(|| std::sync::Mutex::new(()));

pub use api::{ApiClient, ApiError, ApiRequest, AuthApi, Blob, MultipartBody};
pub use app::FleetDesk;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, ClientMetrics, MetricsSnapshot};
pub use services::{
    CompaniesService, DocumentsService, EmployeesService, EquipmentService, ListQuery,
    ResourceService, TiresService,
};
