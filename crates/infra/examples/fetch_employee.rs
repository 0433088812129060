//! Example: sign in and fetch an employee
//!
//! # Setup
//!
//! ```bash
//! export FLEETDESK_API_URL=http://localhost:3001
//! export FLEETDESK_EMAIL=jane@example.com
//! export FLEETDESK_PASSWORD=...
//! cargo run -p fleetdesk-infra --example fetch_employee -- 5
//! ```

use anyhow::Context;
use fleetdesk_infra::{config, init_tracing, FleetDesk, ListQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load().context("loading configuration")?;
    init_tracing(&config.logging)?;

    let email = std::env::var("FLEETDESK_EMAIL").context("FLEETDESK_EMAIL not set")?;
    let password = std::env::var("FLEETDESK_PASSWORD").context("FLEETDESK_PASSWORD not set")?;
    let employee_id: i64 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()
        .context("employee id must be an integer")?
        .unwrap_or(5);

    let fleet = FleetDesk::in_memory(&config)?;
    let session = fleet.login(&email, &password).await?;
    tracing::info!(user = %session.user.email, "signed in");

    let employee = fleet.employees.get(employee_id).await?;
    tracing::info!(id = employee.id, name = %employee.name, "fetched employee");

    let companies = fleet.companies.list(&ListQuery::new().limit(10)).await?;
    tracing::info!(
        shown = companies.items.len(),
        total = companies.total,
        "companies on first page"
    );

    let metrics = fleet.client.metrics().snapshot();
    tracing::info!(
        requests = metrics.requests,
        p50_ms = ?metrics.p50_latency_ms,
        "client metrics"
    );

    fleet.logout().await?;
    Ok(())
}
