//! Typed services for the fleet collections
//!
//! Each service derefs to its [`ResourceService`] for the plain CRUD calls
//! and adds the collection's own endpoints.

use std::ops::Deref;
use std::sync::Arc;

use fleetdesk_domain::constants::{
    COMPANIES_PATH, DOCUMENTS_PATH, EMPLOYEES_PATH, EQUIPMENT_PATH, TIRES_PATH,
};
use fleetdesk_domain::{
    Company, Document, Employee, Equipment, MountTireRequest, Page, Tire, TirePosition,
};
use tracing::instrument;

use super::resource::{ListQuery, ResourceService};
use crate::api::{ApiClient, ApiError, Blob, MultipartBody};

macro_rules! resource_facade {
    ($(#[$meta:meta])* $name:ident, $item:ty, $path:expr) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            inner: ResourceService<$item>,
        }

        impl $name {
            /// Facade over the shared client
            pub fn new(client: Arc<ApiClient>) -> Self {
                Self { inner: ResourceService::new(client, $path) }
            }
        }

        impl Deref for $name {
            type Target = ResourceService<$item>;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }
    };
}

resource_facade!(
    /// `/companies`
    CompaniesService,
    Company,
    COMPANIES_PATH
);

resource_facade!(
    /// `/employees`
    EmployeesService,
    Employee,
    EMPLOYEES_PATH
);

resource_facade!(
    /// `/equipment`
    EquipmentService,
    Equipment,
    EQUIPMENT_PATH
);

resource_facade!(
    /// `/tires`
    TiresService,
    Tire,
    TIRES_PATH
);

resource_facade!(
    /// `/documents`; files go up as multipart and come back as blobs
    DocumentsService,
    Document,
    DOCUMENTS_PATH
);

impl EmployeesService {
    /// `GET /companies/{id}/employees`
    pub async fn list_by_company(
        &self,
        company_id: i64,
        query: &ListQuery,
    ) -> Result<Page<Employee>, ApiError> {
        self.list_at(&format!("{}/{}/employees", COMPANIES_PATH, company_id), query).await
    }
}

impl TiresService {
    /// `GET /equipment/{id}/tires`
    pub async fn list_by_equipment(
        &self,
        equipment_id: i64,
        query: &ListQuery,
    ) -> Result<Page<Tire>, ApiError> {
        self.list_at(&format!("{}/{}/tires", EQUIPMENT_PATH, equipment_id), query).await
    }

    /// Put a tire on a vehicle position (`PATCH /tires/{id}/position`)
    #[instrument(skip(self))]
    pub async fn mount(
        &self,
        tire_id: i64,
        equipment_id: i64,
        position: TirePosition,
    ) -> Result<Tire, ApiError> {
        let body = MountTireRequest { equipment_id, position };
        self.client().patch(&format!("{}/position", self.item_path(tire_id)), &body).await
    }
}

impl DocumentsService {
    /// Upload a file as the `file` part, with optional description
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime: Option<&str>,
        description: Option<&str>,
    ) -> Result<Document, ApiError> {
        let mut body =
            MultipartBody::new().file("file", file_name, bytes, mime.map(str::to_string));
        if let Some(description) = description {
            body = body.text("description", description);
        }
        self.client().upload(self.path(), body).await
    }

    /// `GET /documents/{id}/download`
    pub async fn download(&self, id: i64) -> Result<Blob, ApiError> {
        self.client().download(&format!("{}/download", self.item_path(id))).await
    }
}
