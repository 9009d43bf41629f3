//! Alchemy Core: domain types shared by every Alchemy crate.
//!
//! Holds the RBAC data model (tenants, users, roles, permission matrix,
//! user-role assignments), the repository traits that storage backends
//! implement, and the small pure helpers the authorization engine leans on
//! (role-label mapping, module registry, permission codes).

pub mod error;
pub mod models;
pub mod module;
pub mod repository;
pub mod role_mapping;

pub use error::{AlchemyError, AlchemyResult};
