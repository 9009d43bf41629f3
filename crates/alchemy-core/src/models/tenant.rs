//! Tenant domain model.
//!
//! Tenants are the isolation boundary for every RBAC entity. Users, roles,
//! permission rows and role assignments all carry a `tenant_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant that legacy records without an explicit tenant belong to.
pub const DEFAULT_TENANT_ID: Uuid = Uuid::from_u128(1);

/// A customer or organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier (e.g., `acme`).
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
///
/// `id` lets provisioning create well-known tenants such as
/// [`DEFAULT_TENANT_ID`]; `None` generates a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub id: Option<Uuid>,
    pub name: String,
    pub slug: String,
}
