//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! take a `tenant_id` parameter to enforce data isolation; the few
//! unscoped lookups exist only for legacy-data compatibility and say so.

use uuid::Uuid;

use crate::error::AlchemyResult;
use crate::models::{
    permission::{Permission, UpsertPermission},
    role::{CreateRole, Role, UpdateRole},
    tenant::{CreateTenant, Tenant},
    user::{CreateUser, UpdateUser, User},
    user_role::{CreateUserRole, UserRoleAssignment},
};

// ---------------------------------------------------------------------------
// Tenant & user directory
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = AlchemyResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AlchemyResult<Tenant>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = AlchemyResult<Tenant>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = AlchemyResult<User>> + Send;
    /// User ids are globally unique, so this lookup is not tenant-scoped.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AlchemyResult<User>> + Send;
    /// Case-insensitive email lookup across all tenants.
    fn get_by_email(&self, email: &str) -> impl Future<Output = AlchemyResult<User>> + Send;
    fn update(&self, id: Uuid, input: UpdateUser)
    -> impl Future<Output = AlchemyResult<User>> + Send;
    /// Soft-delete: sets `is_active = false`.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = AlchemyResult<()>> + Send;
    /// Active users of a tenant, oldest first.
    fn list_active(&self, tenant_id: Uuid)
    -> impl Future<Output = AlchemyResult<Vec<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Role store
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = AlchemyResult<Role>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = AlchemyResult<Role>> + Send;
    /// Unscoped lookup by id alone, for assignments whose tenant is stale.
    fn find_by_id(&self, id: Uuid) -> impl Future<Output = AlchemyResult<Option<Role>>> + Send;
    /// Exact (case-sensitive) name lookup within a tenant.
    fn get_by_name(
        &self,
        tenant_id: Uuid,
        role_name: &str,
    ) -> impl Future<Output = AlchemyResult<Option<Role>>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = AlchemyResult<Role>> + Send;
    /// Active roles of a tenant, ordered by name.
    fn list_active(&self, tenant_id: Uuid)
    -> impl Future<Output = AlchemyResult<Vec<Role>>> + Send;
}

// ---------------------------------------------------------------------------
// Permission matrix
// ---------------------------------------------------------------------------

pub trait PermissionRepository: Send + Sync {
    /// All permission rows of a role in a tenant.
    fn get_role_permissions(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = AlchemyResult<Vec<Permission>>> + Send;

    /// The row for `(role, module, tenant)`, module compared case-insensitively.
    fn find(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        module_name: &str,
    ) -> impl Future<Output = AlchemyResult<Option<Permission>>> + Send;

    /// Insert the row or overwrite the flags of the existing one, keeping its
    /// id and creation time. Never produces two rows for one key.
    fn upsert(
        &self,
        input: UpsertPermission,
    ) -> impl Future<Output = AlchemyResult<Permission>> + Send;
}

// ---------------------------------------------------------------------------
// User-role assignment
// ---------------------------------------------------------------------------

pub trait UserRoleRepository: Send + Sync {
    /// Assignments of a user. `None` drops the tenant filter.
    fn list_for_user(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> impl Future<Output = AlchemyResult<Vec<UserRoleAssignment>>> + Send;

    fn exists(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = AlchemyResult<bool>> + Send;

    /// Insert an assignment. Fails with `AlreadyExists` if the composite key
    /// is taken.
    fn insert(
        &self,
        input: CreateUserRole,
    ) -> impl Future<Output = AlchemyResult<UserRoleAssignment>> + Send;

    /// Delete by composite key; returns the number of rows removed.
    fn delete(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = AlchemyResult<u64>> + Send;

    /// Refresh `assigned_at` on an existing assignment.
    fn touch(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        tenant_id: Uuid,
    ) -> impl Future<Output = AlchemyResult<()>> + Send;
}
