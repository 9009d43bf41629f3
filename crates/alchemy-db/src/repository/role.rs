//! SurrealDB implementation of [`RoleRepository`].

use alchemy_core::error::AlchemyResult;
use alchemy_core::models::role::{CreateRole, Role, UpdateRole};
use alchemy_core::repository::RoleRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    record_id: String,
    tenant_id: String,
    role_name: String,
    role_description: Option<String>,
    is_system_role: bool,
    is_active: bool,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn try_into_role(self) -> Result<Role, DbError> {
        Ok(Role {
            id: parse_uuid("role", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            role_name: self.role_name,
            role_description: self.role_description,
            is_system_role: self.is_system_role,
            is_active: self.is_active,
            created_by: parse_opt_uuid("created_by", self.created_by.as_deref())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn first_role(rows: Vec<RoleRow>) -> Result<Option<Role>, DbError> {
    rows.into_iter().next().map(RoleRow::try_into_role).transpose()
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> AlchemyResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 tenant_id = $tenant_id, \
                 role_name = $role_name, role_description = $role_description, \
                 is_system_role = $is_system_role, is_active = true, \
                 created_by = $created_by; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('role', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("role_name", input.role_name))
            .bind(("role_description", input.role_description))
            .bind(("is_system_role", input.is_system_role))
            .bind(("created_by", input.created_by.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("role", e))?;

        let rows: Vec<RoleRow> = result.take(1).map_err(DbError::from)?;
        first_role(rows)?.ok_or_else(|| {
            DbError::NotFound {
                entity: "role".into(),
                id: id_str,
            }
            .into()
        })
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> AlchemyResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('role', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        first_role(rows)?.ok_or_else(|| {
            DbError::NotFound {
                entity: "role".into(),
                id: id_str,
            }
            .into()
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AlchemyResult<Option<Role>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('role', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_role(rows)?)
    }

    async fn get_by_name(&self, tenant_id: Uuid, role_name: &str) -> AlchemyResult<Option<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE tenant_id = $tenant_id AND role_name = $role_name \
                 LIMIT 1",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("role_name", role_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_role(rows)?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateRole) -> AlchemyResult<Role> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.role_name.is_some() {
            sets.push("role_name = $role_name");
        }
        if input.role_description.is_some() {
            sets.push("role_description = $role_description");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {} \
             WHERE tenant_id = $tenant_id; \
             SELECT meta::id(id) AS record_id, * \
             FROM type::record('role', $id) \
             WHERE tenant_id = $tenant_id;",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant_id.to_string()));

        if let Some(role_name) = input.role_name {
            builder = builder.bind(("role_name", role_name));
        }
        if let Some(role_description) = input.role_description {
            builder = builder.bind(("role_description", role_description));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("role", e))?;

        let rows: Vec<RoleRow> = result.take(1).map_err(DbError::from)?;
        first_role(rows)?.ok_or_else(|| {
            DbError::NotFound {
                entity: "role".into(),
                id: id_str,
            }
            .into()
        })
    }

    async fn list_active(&self, tenant_id: Uuid) -> AlchemyResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE tenant_id = $tenant_id AND is_active = true \
                 ORDER BY role_name ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;

        let roles = rows
            .into_iter()
            .map(RoleRow::try_into_role)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }
}
