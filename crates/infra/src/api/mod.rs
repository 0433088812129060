//! Backend API access
//!
//! - [`ApiClient`]: bearer-authenticated requests with a per-attempt
//!   deadline and a single refresh-and-retry on 401
//! - [`AuthApi`]: login, logout, and the token refresh call
//! - [`ApiRequest`] / [`Blob`]: request and binary response types

pub mod auth;
pub mod client;
pub mod errors;
pub mod request;
pub mod response;

pub use auth::AuthApi;
pub use client::{ApiClient, ApiClientBuilder};
pub use errors::{ApiError, ApiErrorCategory};
pub use request::{ApiRequest, MultipartBody, MultipartPart, RequestBody};
pub use response::Blob;
