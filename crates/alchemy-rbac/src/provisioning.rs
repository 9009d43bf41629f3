//! Role provisioning: system roles, legacy label sync, SSO first login and
//! assignment backfill.

use alchemy_core::error::AlchemyError;
use alchemy_core::models::role::{CreateRole, Role};
use alchemy_core::models::user::User;
use alchemy_core::repository::{PermissionRepository, RoleRepository, UserRoleRepository};
use alchemy_core::role_mapping::{SystemRole, canonical_role_name};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::RbacError;
use crate::service::{AssignmentOutcome, RbacService};

/// Counts from a [`backfill_user_roles`](RbacService::backfill_user_roles) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Assignments inserted, or refreshed when forced.
    pub updated: usize,
    /// Users that already held their mapped role.
    pub skipped: usize,
    pub errors: usize,
    /// Active users examined.
    pub total: usize,
}

impl<R, P, A> RbacService<R, P, A>
where
    R: RoleRepository,
    P: PermissionRepository,
    A: UserRoleRepository,
{
    /// Create the canonical roles of a tenant that do not exist yet.
    ///
    /// Returns every system role of the tenant, pre-existing ones included.
    pub async fn seed_system_roles(&self, tenant_id: Uuid) -> Result<Vec<Role>, RbacError> {
        let mut roles = Vec::with_capacity(SystemRole::ALL.len());
        let mut created = 0usize;

        for system_role in SystemRole::ALL {
            let name = system_role.role_name();
            if let Some(existing) = self.role_repo.get_by_name(tenant_id, name).await? {
                roles.push(existing);
                continue;
            }

            let input = CreateRole {
                tenant_id,
                role_name: name.to_string(),
                role_description: Some(system_role.description().to_string()),
                is_system_role: true,
                created_by: None,
            };
            match self.role_repo.create(input).await {
                Ok(role) => {
                    created += 1;
                    roles.push(role);
                }
                // Seeded concurrently by another process.
                Err(AlchemyError::AlreadyExists { .. }) => {
                    let role = self
                        .role_repo
                        .get_by_name(tenant_id, name)
                        .await?
                        .ok_or_else(|| RbacError::RoleNotFound(name.to_string()))?;
                    roles.push(role);
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(%tenant_id, created, total = roles.len(), "System roles seeded");
        Ok(roles)
    }

    async fn role_for_label(&self, tenant_id: Uuid, label: Option<&str>) -> Result<Role, RbacError> {
        let role_name = canonical_role_name(label);
        self.role_repo
            .get_by_name(tenant_id, role_name)
            .await?
            .ok_or_else(|| RbacError::RoleNotFound(format!("{role_name} in tenant {tenant_id}")))
    }

    /// Assign the role a legacy label maps to. Used when a user is created.
    pub async fn assign_role_by_label(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        label: Option<&str>,
        assigned_by: Option<Uuid>,
    ) -> Result<AssignmentOutcome, RbacError> {
        let role = self.role_for_label(tenant_id, label).await?;
        self.assign_role_to_user(user_id, role.id, tenant_id, assigned_by)
            .await
    }

    /// Drop every assignment the user holds in the tenant, then assign the
    /// role the new label maps to. Used when a user's label is edited.
    ///
    /// The target role is resolved before anything is removed, so an
    /// unmappable tenant leaves the user's roles untouched.
    pub async fn replace_user_role(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        label: Option<&str>,
        assigned_by: Option<Uuid>,
    ) -> Result<AssignmentOutcome, RbacError> {
        let role = self.role_for_label(tenant_id, label).await?;

        let current = self
            .user_role_repo
            .list_for_user(user_id, Some(tenant_id))
            .await?;
        for assignment in &current {
            self.user_role_repo
                .delete(user_id, assignment.role_id, tenant_id)
                .await?;
        }
        debug!(%user_id, %tenant_id, removed = current.len(), "Cleared user roles");

        self.assign_role_to_user(user_id, role.id, tenant_id, assigned_by)
            .await
    }

    /// Give a user signing in through SSO for the first time the Viewer
    /// role. Users that already hold a role in the tenant are left alone.
    pub async fn provision_sso_user(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<AssignmentOutcome, RbacError> {
        let existing = self
            .user_role_repo
            .list_for_user(user_id, Some(tenant_id))
            .await?;
        if !existing.is_empty() {
            return Ok(AssignmentOutcome::AlreadyAssigned);
        }

        let outcome = self
            .assign_role_by_label(
                user_id,
                tenant_id,
                Some(SystemRole::Viewer.role_name()),
                None,
            )
            .await?;
        info!(%user_id, %tenant_id, "SSO user provisioned as Viewer");
        Ok(outcome)
    }

    /// Map the legacy label of every active user onto an assignment.
    ///
    /// Users with a nil tenant id are treated as belonging to
    /// `fallback_tenant_id`. With `force`, existing assignments get a fresh
    /// `assigned_at` and count as updated instead of skipped. One user's
    /// failure is counted and does not stop the run.
    pub async fn backfill_user_roles(
        &self,
        users: &[User],
        fallback_tenant_id: Uuid,
        force: bool,
    ) -> BackfillReport {
        let mut report = BackfillReport::default();

        for user in users.iter().filter(|u| u.is_active) {
            report.total += 1;
            let tenant_id = if user.tenant_id.is_nil() {
                fallback_tenant_id
            } else {
                user.tenant_id
            };

            match self.backfill_one(user, tenant_id, force).await {
                Ok(true) => report.updated += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(
                        user_id = %user.id,
                        %tenant_id,
                        error = %e,
                        "Role backfill failed for user"
                    );
                    report.errors += 1;
                }
            }
        }

        info!(
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors,
            total = report.total,
            "Role backfill finished"
        );
        report
    }

    /// Returns whether the user's assignment was written.
    async fn backfill_one(&self, user: &User, tenant_id: Uuid, force: bool) -> Result<bool, RbacError> {
        let role = self.role_for_label(tenant_id, user.role.as_deref()).await?;

        if self
            .user_role_repo
            .exists(user.id, role.id, tenant_id)
            .await?
        {
            if !force {
                return Ok(false);
            }
            self.user_role_repo.touch(user.id, role.id, tenant_id).await?;
            return Ok(true);
        }

        let outcome = self
            .assign_role_to_user(user.id, role.id, tenant_id, None)
            .await?;
        Ok(outcome == AssignmentOutcome::Created || force)
    }
}
