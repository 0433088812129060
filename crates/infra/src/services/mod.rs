//! Resource services over the API client
//!
//! [`ResourceService`] covers list/get/create/update/delete for one
//! collection; the typed services add collection-specific endpoints.

pub mod fleet;
pub mod resource;

pub use fleet::{
    CompaniesService, DocumentsService, EmployeesService, EquipmentService, TiresService,
};
pub use resource::{ListQuery, ResourceService};
