//! Domain types and models

pub mod listing;
pub mod resources;
pub mod session;

pub use listing::{Envelope, ListPayload, Page, PageMeta};
pub use resources::{
    Company, Document, Employee, Equipment, MountTireRequest, Tire, TirePosition, TireStatus,
};
pub use session::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RefreshedTokens, Session,
    UserIdentity,
};
