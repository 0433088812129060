//! Conversions from external infrastructure errors into domain errors.

use fleetdesk_domain::FleetDeskError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FleetDeskError);

impl From<InfraError> for FleetDeskError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FleetDeskError> for InfraError {
    fn from(value: FleetDeskError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoFleetDeskError {
    fn into_fleetdesk(self) -> FleetDeskError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FleetDeskError */
/* -------------------------------------------------------------------------- */

impl IntoFleetDeskError for HttpError {
    fn into_fleetdesk(self) -> FleetDeskError {
        if self.is_timeout() {
            return FleetDeskError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return FleetDeskError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return FleetDeskError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => FleetDeskError::Auth(message),
                404 => FleetDeskError::NotFound(message),
                400..=499 => FleetDeskError::InvalidInput(message),
                _ => FleetDeskError::Network(message),
            };
        }

        FleetDeskError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_fleetdesk())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
