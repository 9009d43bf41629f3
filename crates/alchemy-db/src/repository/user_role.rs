//! SurrealDB implementation of [`UserRoleRepository`].
//!
//! Each assignment lives at a record id derived from its composite key,
//! so a second `CREATE` for the same `(user, role, tenant)` fails on the
//! record itself before the UNIQUE index is consulted.

use alchemy_core::error::AlchemyResult;
use alchemy_core::models::user_role::{CreateUserRole, UserRoleAssignment};
use alchemy_core::repository::UserRoleRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::{SurrealValue, Value};
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserRoleRow {
    record_id: String,
    user_id: String,
    role_id: String,
    tenant_id: String,
    assigned_by: Option<String>,
    assigned_at: DateTime<Utc>,
}

impl UserRoleRow {
    fn try_into_assignment(self) -> Result<UserRoleAssignment, DbError> {
        Ok(UserRoleAssignment {
            id: parse_uuid("user_role", &self.record_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            role_id: parse_uuid("role", &self.role_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            assigned_by: parse_opt_uuid("assigned_by", self.assigned_by.as_deref())?,
            assigned_at: self.assigned_at,
        })
    }
}

/// SurrealDB implementation of the UserRole repository.
#[derive(Clone)]
pub struct SurrealUserRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRoleRepository for SurrealUserRoleRepository<C> {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> AlchemyResult<Vec<UserRoleAssignment>> {
        let filter = if tenant_id.is_some() {
            "WHERE user_id = $user_id AND tenant_id = $tenant_id"
        } else {
            "WHERE user_id = $user_id"
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user_role {filter} \
             ORDER BY assigned_at ASC"
        );

        let mut builder = self.db.query(&query).bind(("user_id", user_id.to_string()));
        if let Some(tenant_id) = tenant_id {
            builder = builder.bind(("tenant_id", tenant_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<UserRoleRow> = result.take(0).map_err(DbError::from)?;

        let assignments = rows
            .into_iter()
            .map(UserRoleRow::try_into_assignment)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(assignments)
    }

    async fn exists(&self, user_id: Uuid, role_id: Uuid, tenant_id: Uuid) -> AlchemyResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_role \
                 WHERE user_id = $user_id AND role_id = $role_id \
                 AND tenant_id = $tenant_id LIMIT 1",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, input: CreateUserRole) -> AlchemyResult<UserRoleAssignment> {
        let id = UserRoleAssignment::key_id(input.user_id, input.role_id, input.tenant_id);
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user_role', $id) SET \
                 user_id = $user_id, role_id = $role_id, \
                 tenant_id = $tenant_id, assigned_by = $assigned_by; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('user_role', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("role_id", input.role_id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("assigned_by", input.assigned_by.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("user_role", e))?;

        let rows: Vec<UserRoleRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user_role".into(),
            id: id_str,
        })?;

        Ok(row.try_into_assignment()?)
    }

    async fn delete(&self, user_id: Uuid, role_id: Uuid, tenant_id: Uuid) -> AlchemyResult<u64> {
        let mut result = self
            .db
            .query(
                "DELETE user_role \
                 WHERE user_id = $user_id AND role_id = $role_id \
                 AND tenant_id = $tenant_id RETURN BEFORE",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let removed: Vec<Value> = result.take(0).map_err(DbError::from)?;
        Ok(removed.len() as u64)
    }

    async fn touch(&self, user_id: Uuid, role_id: Uuid, tenant_id: Uuid) -> AlchemyResult<()> {
        self.db
            .query(
                "UPDATE user_role SET assigned_at = time::now() \
                 WHERE user_id = $user_id AND role_id = $role_id \
                 AND tenant_id = $tenant_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement("user_role", e))?;

        Ok(())
    }
}
