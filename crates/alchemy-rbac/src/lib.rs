//! Alchemy RBAC: the authorization engine.
//!
//! [`RbacService`] answers "may this user perform this action on this
//! module in this tenant?" by walking user-role assignments, roles and the
//! permission matrix. Checks never fail: any storage error is logged and
//! becomes a deny. Mutations (role management, permission upserts,
//! assignments) return [`RbacError`] on failure.

pub mod config;
pub mod error;
pub mod provisioning;
pub mod service;

pub use config::RbacConfig;
pub use error::RbacError;
pub use provisioning::BackfillReport;
pub use service::{AssignmentOutcome, RbacService};
