//! Authorization engine: permission checks and role/permission mutations.

use alchemy_core::error::{AlchemyError, AlchemyResult};
use alchemy_core::models::permission::{Action, Permission, PermissionFlags, UpsertPermission};
use alchemy_core::models::role::{CreateRole, Role, UpdateRole};
use alchemy_core::models::user_role::{CreateUserRole, RoleAssignment};
use alchemy_core::module::{PermissionCode, is_known_module};
use alchemy_core::repository::{PermissionRepository, RoleRepository, UserRoleRepository};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RbacConfig;
use crate::error::RbacError;

/// Result of an assignment request. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOutcome {
    Created,
    AlreadyAssigned,
}

/// Role-based authorization service.
///
/// Generic over repository implementations so that the engine has no
/// dependency on the database crate.
pub struct RbacService<R: RoleRepository, P: PermissionRepository, A: UserRoleRepository> {
    pub(crate) role_repo: R,
    pub(crate) permission_repo: P,
    pub(crate) user_role_repo: A,
    pub(crate) config: RbacConfig,
}

impl<R, P, A> RbacService<R, P, A>
where
    R: RoleRepository,
    P: PermissionRepository,
    A: UserRoleRepository,
{
    pub fn new(role_repo: R, permission_repo: P, user_role_repo: A, config: RbacConfig) -> Self {
        Self {
            role_repo,
            permission_repo,
            user_role_repo,
            config,
        }
    }

    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------------

    /// Decide whether `user_id` may perform `action` on `module_name` in
    /// `tenant_id`.
    ///
    /// A super admin is always allowed. Otherwise the grants of every
    /// assigned role are OR-ed together. Storage failures deny.
    pub async fn check_permission(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        module_name: &str,
        action: Action,
    ) -> bool {
        match self.evaluate(user_id, tenant_id, module_name, action).await {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!(
                    %user_id,
                    %tenant_id,
                    module = module_name,
                    %action,
                    error = %e,
                    "Permission check failed, denying"
                );
                false
            }
        }
    }

    /// [`check_permission`](Self::check_permission) for a parsed permission code.
    pub async fn check_code(&self, user_id: Uuid, tenant_id: Uuid, code: &PermissionCode) -> bool {
        self.check_permission(user_id, tenant_id, &code.module, code.action)
            .await
    }

    /// Whether any effective role of the user is "Super Admin" (any case).
    pub async fn is_superadmin(&self, user_id: Uuid, tenant_id: Uuid) -> bool {
        match self.get_user_roles(user_id, tenant_id).await {
            Ok(roles) => self.has_superadmin(&roles),
            Err(e) => {
                warn!(%user_id, %tenant_id, error = %e, "Super admin lookup failed, denying");
                false
            }
        }
    }

    async fn evaluate(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        module_name: &str,
        action: Action,
    ) -> AlchemyResult<bool> {
        let roles = self.get_user_roles(user_id, tenant_id).await?;

        if self.has_superadmin(&roles) {
            debug!(%user_id, %tenant_id, module = module_name, %action, "Super admin override");
            return Ok(true);
        }
        if roles.is_empty() {
            debug!(%user_id, %tenant_id, "No roles assigned, denying");
            return Ok(false);
        }

        for assignment in &roles {
            if assignment.role.as_ref().is_some_and(|r| !self.is_effective(r)) {
                continue;
            }
            let role_id = assignment.role_id();
            let permissions = self
                .permission_repo
                .get_role_permissions(tenant_id, role_id)
                .await?;

            if permissions
                .iter()
                .any(|p| p.applies_to(module_name) && p.allows(action))
            {
                debug!(
                    %user_id,
                    %tenant_id,
                    %role_id,
                    module = module_name,
                    %action,
                    "Permission granted"
                );
                return Ok(true);
            }
        }

        debug!(%user_id, %tenant_id, module = module_name, %action, "No role grants permission");
        Ok(false)
    }

    fn is_effective(&self, role: &Role) -> bool {
        role.is_active || !self.config.ignore_inactive_roles
    }

    fn has_superadmin(&self, roles: &[RoleAssignment]) -> bool {
        roles.iter().any(|a| {
            a.role
                .as_ref()
                .is_some_and(|r| r.is_super_admin() && self.is_effective(r))
        })
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Assignments of a user in a tenant, each with its resolved role.
    ///
    /// With `tenant_fallback` enabled, a user with no assignments in
    /// `tenant_id` gets the assignments from every tenant instead. Roles are
    /// resolved in `tenant_id` first and then by id alone; an assignment
    /// whose role resolves nowhere is returned with `role: None`.
    pub async fn get_user_roles(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> AlchemyResult<Vec<RoleAssignment>> {
        let mut assignments = self
            .user_role_repo
            .list_for_user(user_id, Some(tenant_id))
            .await?;

        if assignments.is_empty() && self.config.tenant_fallback {
            assignments = self.user_role_repo.list_for_user(user_id, None).await?;
            if !assignments.is_empty() {
                debug!(
                    %user_id,
                    %tenant_id,
                    count = assignments.len(),
                    "Using assignments from other tenants"
                );
            }
        }

        let mut resolved = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let role = self.resolve_role(assignment.role_id, tenant_id).await?;
            if role.is_none() {
                debug!(%user_id, role_id = %assignment.role_id, "Assigned role not found");
            }
            resolved.push(RoleAssignment { assignment, role });
        }

        Ok(resolved)
    }

    async fn resolve_role(&self, role_id: Uuid, tenant_id: Uuid) -> AlchemyResult<Option<Role>> {
        match self.role_repo.get_by_id(tenant_id, role_id).await {
            Ok(role) => Ok(Some(role)),
            Err(e) if e.is_not_found() => self.role_repo.find_by_id(role_id).await,
            Err(e) => Err(e),
        }
    }

    /// Permission rows of a role in a tenant; empty when none exist.
    pub async fn get_role_permissions(
        &self,
        role_id: Uuid,
        tenant_id: Uuid,
    ) -> AlchemyResult<Vec<Permission>> {
        self.permission_repo
            .get_role_permissions(tenant_id, role_id)
            .await
    }

    /// Active roles of a tenant.
    pub async fn get_all_roles(&self, tenant_id: Uuid) -> AlchemyResult<Vec<Role>> {
        self.role_repo.list_active(tenant_id).await
    }

    pub async fn get_role_id_by_name(
        &self,
        tenant_id: Uuid,
        role_name: &str,
    ) -> AlchemyResult<Option<Uuid>> {
        Ok(self
            .role_repo
            .get_by_name(tenant_id, role_name)
            .await?
            .map(|r| r.id))
    }

    // -----------------------------------------------------------------------
    // Role management
    // -----------------------------------------------------------------------

    pub async fn create_role(
        &self,
        tenant_id: Uuid,
        role_name: &str,
        role_description: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Role, RbacError> {
        let role_name = validate_role_name(role_name)?;

        let role = self
            .role_repo
            .create(CreateRole {
                tenant_id,
                role_name: role_name.clone(),
                role_description,
                is_system_role: false,
                created_by,
            })
            .await
            .map_err(|e| match e {
                AlchemyError::AlreadyExists { .. } => {
                    RbacError::Validation(format!("role '{role_name}' already exists"))
                }
                other => other.into(),
            })?;

        info!(%tenant_id, role_id = %role.id, role_name = %role.role_name, "Role created");
        Ok(role)
    }

    pub async fn update_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        mut input: UpdateRole,
    ) -> Result<Role, RbacError> {
        if let Some(name) = input.role_name.take() {
            input.role_name = Some(validate_role_name(&name)?);
        }
        self.role_repo
            .update(tenant_id, role_id, input)
            .await
            .map_err(|e| match e {
                AlchemyError::NotFound { .. } => RbacError::RoleNotFound(role_id.to_string()),
                AlchemyError::AlreadyExists { .. } => {
                    RbacError::Validation("role name already in use".into())
                }
                other => other.into(),
            })
    }

    /// Roles are never hard-deleted.
    pub async fn deactivate_role(&self, tenant_id: Uuid, role_id: Uuid) -> Result<Role, RbacError> {
        let role = self
            .update_role(
                tenant_id,
                role_id,
                UpdateRole {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        info!(%tenant_id, %role_id, "Role deactivated");
        Ok(role)
    }

    async fn require_role(&self, tenant_id: Uuid, role_id: Uuid) -> Result<Role, RbacError> {
        self.role_repo
            .get_by_id(tenant_id, role_id)
            .await
            .map_err(|e| match e {
                AlchemyError::NotFound { .. } => RbacError::RoleNotFound(role_id.to_string()),
                other => other.into(),
            })
    }

    // -----------------------------------------------------------------------
    // Permission matrix
    // -----------------------------------------------------------------------

    /// Set the six flags of `(role, module, tenant)`, creating the row if
    /// needed. An existing row keeps its id.
    pub async fn update_role_permissions(
        &self,
        role_id: Uuid,
        tenant_id: Uuid,
        module_name: &str,
        flags: PermissionFlags,
    ) -> Result<Permission, RbacError> {
        let module_name = module_name.trim();
        if module_name.is_empty() {
            return Err(RbacError::Validation("module name must not be empty".into()));
        }
        if self.config.strict_modules && !is_known_module(module_name) {
            return Err(RbacError::Validation(format!("unknown module: {module_name}")));
        }
        self.require_role(tenant_id, role_id).await?;

        let permission = self
            .permission_repo
            .upsert(UpsertPermission {
                tenant_id,
                role_id,
                module_name: module_name.to_string(),
                flags,
            })
            .await?;

        info!(
            %tenant_id,
            %role_id,
            module = module_name,
            permission_id = %permission.id,
            "Role permissions updated"
        );
        Ok(permission)
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    /// Grant a role. Granting a role the user already holds succeeds with
    /// [`AssignmentOutcome::AlreadyAssigned`].
    pub async fn assign_role_to_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        tenant_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<AssignmentOutcome, RbacError> {
        self.require_role(tenant_id, role_id).await?;

        if self
            .user_role_repo
            .exists(user_id, role_id, tenant_id)
            .await?
        {
            debug!(%user_id, %role_id, %tenant_id, "Role already assigned");
            return Ok(AssignmentOutcome::AlreadyAssigned);
        }

        match self
            .user_role_repo
            .insert(CreateUserRole {
                user_id,
                role_id,
                tenant_id,
                assigned_by,
            })
            .await
        {
            Ok(_) => {
                info!(%user_id, %role_id, %tenant_id, "Role assigned");
                Ok(AssignmentOutcome::Created)
            }
            // Lost a race with a concurrent grant of the same role.
            Err(AlchemyError::AlreadyExists { .. }) => {
                debug!(%user_id, %role_id, %tenant_id, "Role assigned concurrently");
                Ok(AssignmentOutcome::AlreadyAssigned)
            }
            // A conflicting transaction may surface as a plain storage error;
            // the grant holds if the assignment is there now.
            Err(e) => {
                if self
                    .user_role_repo
                    .exists(user_id, role_id, tenant_id)
                    .await?
                {
                    debug!(%user_id, %role_id, %tenant_id, error = %e, "Role assigned concurrently");
                    return Ok(AssignmentOutcome::AlreadyAssigned);
                }
                Err(e.into())
            }
        }
    }

    /// Revoke a role, then confirm the assignment is gone.
    pub async fn remove_role_from_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<(), RbacError> {
        if !self
            .user_role_repo
            .exists(user_id, role_id, tenant_id)
            .await?
        {
            return Err(RbacError::AssignmentNotFound {
                user_id,
                role_id,
                tenant_id,
            });
        }

        let removed = self
            .user_role_repo
            .delete(user_id, role_id, tenant_id)
            .await?;

        if self
            .user_role_repo
            .exists(user_id, role_id, tenant_id)
            .await?
        {
            warn!(%user_id, %role_id, %tenant_id, removed, "Assignment survived delete");
            return Err(RbacError::DeleteNotApplied {
                user_id,
                role_id,
                tenant_id,
            });
        }

        if removed == 0 {
            debug!(%user_id, %role_id, %tenant_id, "Assignment removed concurrently");
        }
        info!(%user_id, %role_id, %tenant_id, "Role removed");
        Ok(())
    }
}

fn validate_role_name(role_name: &str) -> Result<String, RbacError> {
    let trimmed = role_name.trim();
    if trimmed.is_empty() {
        return Err(RbacError::Validation("role name must not be empty".into()));
    }
    Ok(trimmed.to_string())
}
