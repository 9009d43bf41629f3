//! Domain models for Alchemy.
//!
//! These are the core RBAC types shared across all crates.

pub mod permission;
pub mod role;
pub mod tenant;
pub mod user;
pub mod user_role;
