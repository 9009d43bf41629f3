//! User-role assignment model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// Link between a user and a role inside one tenant.
///
/// `(user_id, role_id, tenant_id)` is the identity of an assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub tenant_id: Uuid,
    /// User who granted the role, if known.
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
}

impl UserRoleAssignment {
    /// Deterministic record id for a composite key, so concurrent writers of
    /// the same assignment land on the same record.
    pub fn key_id(user_id: Uuid, role_id: Uuid, tenant_id: Uuid) -> Uuid {
        let key = format!("user_role/{user_id}/{role_id}/{tenant_id}");
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub tenant_id: Uuid,
    pub assigned_by: Option<Uuid>,
}

/// An assignment together with the role it points to.
///
/// `role` is `None` when the role record could not be resolved; the
/// assignment is still reported so callers inspecting `role_id` see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub assignment: UserRoleAssignment,
    pub role: Option<Role>,
}

impl RoleAssignment {
    pub fn role_id(&self) -> Uuid {
        self.assignment.role_id
    }

    pub fn role_name(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.role_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_id_is_stable_per_composite_key() {
        let (u, r, t) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            UserRoleAssignment::key_id(u, r, t),
            UserRoleAssignment::key_id(u, r, t)
        );
        assert_ne!(
            UserRoleAssignment::key_id(u, r, t),
            UserRoleAssignment::key_id(u, r, Uuid::new_v4())
        );
    }
}
