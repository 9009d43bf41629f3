//! SurrealDB implementation of [`PermissionRepository`].
//!
//! Rows are keyed by `(tenant_id, role_id, module_key)` where `module_key`
//! is the lowercased module name. New rows get a deterministic record id
//! derived from that key, so two writers racing on the same key both
//! `UPSERT` the same record; the UNIQUE index catches rows created under
//! any other id.

use alchemy_core::error::{AlchemyError, AlchemyResult};
use alchemy_core::models::permission::{Permission, PermissionFlags, UpsertPermission, parse_flag};
use alchemy_core::module::module_key;
use alchemy_core::repository::PermissionRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// Capability columns are cast to strings so that bool, int and text
/// representations all reach [`parse_flag`].
const PERMISSION_SELECT: &str = "\
SELECT meta::id(id) AS record_id, tenant_id, role_id, module_name, \
<string> can_create AS can_create, \
<string> can_retrieve AS can_retrieve, \
<string> can_update AS can_update, \
<string> can_delete AS can_delete, \
<string> can_comment AS can_comment, \
<string> can_create_task AS can_create_task, \
created_at, updated_at FROM permission";

const SET_FLAGS: &str = "\
can_create = $can_create, can_retrieve = $can_retrieve, \
can_update = $can_update, can_delete = $can_delete, \
can_comment = $can_comment, can_create_task = $can_create_task, \
updated_at = time::now()";

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    record_id: String,
    tenant_id: String,
    role_id: String,
    module_name: String,
    can_create: String,
    can_retrieve: String,
    can_update: String,
    can_delete: String,
    can_comment: String,
    can_create_task: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn try_into_permission(self) -> Result<Permission, DbError> {
        Ok(Permission {
            id: parse_uuid("permission", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            role_id: parse_uuid("role", &self.role_id)?,
            module_name: self.module_name,
            flags: PermissionFlags {
                can_create: parse_flag(&self.can_create),
                can_retrieve: parse_flag(&self.can_retrieve),
                can_update: parse_flag(&self.can_update),
                can_delete: parse_flag(&self.can_delete),
                can_comment: parse_flag(&self.can_comment),
                can_create_task: parse_flag(&self.can_create_task),
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn update_flags(&self, id: Uuid, flags: PermissionFlags) -> Result<(), DbError> {
        let query = format!("UPDATE type::record('permission', $id) SET {SET_FLAGS}");
        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("can_create", flags.can_create))
            .bind(("can_retrieve", flags.can_retrieve))
            .bind(("can_update", flags.can_update))
            .bind(("can_delete", flags.can_delete))
            .bind(("can_comment", flags.can_comment))
            .bind(("can_create_task", flags.can_create_task))
            .await?;
        result
            .check()
            .map_err(|e| DbError::from_statement("permission", e))?;
        Ok(())
    }

    async fn insert_keyed(&self, input: &UpsertPermission) -> Result<(), DbError> {
        let id = Permission::key_id(input.tenant_id, input.role_id, &input.module_name);
        let query = format!(
            "UPSERT type::record('permission', $id) SET \
             tenant_id = $tenant_id, role_id = $role_id, \
             module_name = $module_name, module_key = $module_key, {SET_FLAGS}"
        );
        let flags = input.flags;
        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("role_id", input.role_id.to_string()))
            .bind(("module_name", input.module_name.clone()))
            .bind(("module_key", module_key(&input.module_name)))
            .bind(("can_create", flags.can_create))
            .bind(("can_retrieve", flags.can_retrieve))
            .bind(("can_update", flags.can_update))
            .bind(("can_delete", flags.can_delete))
            .bind(("can_comment", flags.can_comment))
            .bind(("can_create_task", flags.can_create_task))
            .await?;
        result
            .check()
            .map_err(|e| DbError::from_statement("permission", e))?;
        Ok(())
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn get_role_permissions(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> AlchemyResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(format!(
                "{PERMISSION_SELECT} \
                 WHERE tenant_id = $tenant_id AND role_id = $role_id \
                 ORDER BY module_key ASC"
            ))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;

        let permissions = rows
            .into_iter()
            .map(PermissionRow::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }

    async fn find(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        module_name: &str,
    ) -> AlchemyResult<Option<Permission>> {
        let mut result = self
            .db
            .query(format!(
                "{PERMISSION_SELECT} \
                 WHERE tenant_id = $tenant_id AND role_id = $role_id \
                 AND module_key = $module_key LIMIT 1"
            ))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .bind(("module_key", module_key(module_name)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(PermissionRow::try_into_permission)
            .transpose()?)
    }

    async fn upsert(&self, input: UpsertPermission) -> AlchemyResult<Permission> {
        // One retry covers a row that appeared under another id between the
        // lookup and the keyed insert.
        for attempt in 0..2 {
            match self
                .find(input.tenant_id, input.role_id, &input.module_name)
                .await?
            {
                Some(existing) => {
                    debug!(permission_id = %existing.id, "Updating permission row");
                    self.update_flags(existing.id, input.flags).await?;
                    break;
                }
                None => match self.insert_keyed(&input).await {
                    Ok(()) => break,
                    Err(DbError::Duplicate { .. }) if attempt == 0 => continue,
                    Err(e) => return Err(e.into()),
                },
            }
        }

        self.find(input.tenant_id, input.role_id, &input.module_name)
            .await?
            .ok_or_else(|| {
                AlchemyError::Database(format!(
                    "permission for role {} module {} missing after upsert",
                    input.role_id, input.module_name
                ))
            })
    }
}
