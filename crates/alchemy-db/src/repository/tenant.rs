//! SurrealDB implementation of [`TenantRepository`].

use alchemy_core::error::AlchemyResult;
use alchemy_core::models::tenant::{CreateTenant, Tenant};
use alchemy_core::repository::TenantRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TenantRow {
    record_id: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid("tenant", &self.record_id)?,
            name: self.name,
            slug: self.slug,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_one(
        &self,
        query: &str,
        key: &'static str,
        value: String,
    ) -> AlchemyResult<Tenant> {
        let mut result = self
            .db
            .query(query)
            .bind((key, value.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: value,
        })?;
        Ok(row.try_into_tenant()?)
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> AlchemyResult<Tenant> {
        let id = input.id.unwrap_or_else(Uuid::new_v4);

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, slug = $slug; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('tenant', $id);",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("tenant", e))?;

        let rows: Vec<TenantRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;
        Ok(row.try_into_tenant()?)
    }

    async fn get_by_id(&self, id: Uuid) -> AlchemyResult<Tenant> {
        self.fetch_one(
            "SELECT meta::id(id) AS record_id, * FROM type::record('tenant', $id)",
            "id",
            id.to_string(),
        )
        .await
    }

    async fn get_by_slug(&self, slug: &str) -> AlchemyResult<Tenant> {
        self.fetch_one(
            "SELECT meta::id(id) AS record_id, * FROM tenant WHERE slug = $slug",
            "slug",
            slug.to_string(),
        )
        .await
    }
}
