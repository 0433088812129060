//! Wiring for a complete client: one session store, one refresh
//! coordinator, one API client, and the resource services on top

use std::sync::Arc;

use fleetdesk_core::auth::{
    ForcedLogout, InMemorySessionStore, RefreshCoordinator, SessionStore,
};
use fleetdesk_domain::{Config, LoginRequest, Session};
use tracing::info;

use crate::api::{ApiClient, ApiError, AuthApi};
use crate::services::{
    CompaniesService, DocumentsService, EmployeesService, EquipmentService, TiresService,
};

/// Everything needed to talk to the fleet backend
pub struct FleetDesk {
    pub auth: Arc<AuthApi>,
    pub client: Arc<ApiClient>,
    pub companies: CompaniesService,
    pub employees: EmployeesService,
    pub equipment: EquipmentService,
    pub tires: TiresService,
    pub documents: DocumentsService,
    sessions: Arc<dyn SessionStore>,
}

impl FleetDesk {
    /// # Errors
    /// Returns `ApiError::Config` if a transport cannot be built.
    pub fn new(config: &Config, sessions: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let auth =
            Arc::new(AuthApi::new(config.api.clone(), config.auth.clone(), sessions.clone())?);
        let logout = Arc::new(ForcedLogout::new(sessions.clone(), &config.auth.login_path));
        let coordinator = RefreshCoordinator::new(sessions.clone(), auth.clone(), logout);

        let client = Arc::new(
            ApiClient::builder()
                .config(config.api.clone())
                .sessions(sessions.clone())
                .coordinator(coordinator)
                .build()?,
        );

        info!(base_url = %config.api.base_url(), context = %config.api.context, "client ready");

        Ok(Self {
            auth,
            companies: CompaniesService::new(client.clone()),
            employees: EmployeesService::new(client.clone()),
            equipment: EquipmentService::new(client.clone()),
            tires: TiresService::new(client.clone()),
            documents: DocumentsService::new(client.clone()),
            client,
            sessions,
        })
    }

    /// Client with a process-local session store
    ///
    /// # Errors
    /// See [`FleetDesk::new`].
    pub fn in_memory(config: &Config) -> Result<Self, ApiError> {
        Self::new(config, Arc::new(InMemorySessionStore::new()))
    }

    /// Sign in and store the session
    ///
    /// # Errors
    /// See [`AuthApi::login`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        self.auth.login(&LoginRequest::new(email, password)).await
    }

    /// Sign out and clear the session
    ///
    /// # Errors
    /// See [`AuthApi::logout`].
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.auth.logout().await
    }

    /// Current session, if signed in
    pub async fn session(&self) -> Option<Session> {
        self.sessions.current_session().await
    }

    /// Store shared by every client in this bundle
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }
}
