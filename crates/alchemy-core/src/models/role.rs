//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role_mapping::SystemRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Unique within the tenant. Stored as entered.
    pub role_name: String,
    pub role_description: Option<String>,
    pub is_system_role: bool,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Whether this role bypasses every permission check.
    pub fn is_super_admin(&self) -> bool {
        SystemRole::SuperAdmin.matches(&self.role_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub tenant_id: Uuid,
    pub role_name: String,
    pub role_description: Option<String>,
    pub is_system_role: bool,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub role_name: Option<String>,
    /// `Some(Some(v))` = set, `Some(None)` = clear, `None` = no change.
    pub role_description: Option<Option<String>>,
    pub is_active: Option<bool>,
}
