//! # FleetDesk Domain
//!
//! Business domain types and models for the FleetDesk client.
//!
//! This crate contains:
//! - Session and auth wire types
//! - Entity DTOs (companies, employees, equipment, tires, documents)
//! - List response shapes and their normalization
//! - Configuration structures and the domain error type
//!
//! ## Architecture
//! - No dependencies on other FleetDesk crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
