//! SurrealDB implementation of [`UserRepository`].
//!
//! Emails are lowercased on the way in, which makes the UNIQUE index on
//! `email` case-insensitive. Password hashing uses Argon2id with
//! OWASP-recommended parameters (memory: 19 MiB, iterations: 2,
//! parallelism: 1) and an optional server-side pepper.

use alchemy_core::error::AlchemyResult;
use alchemy_core::models::user::{CreateUser, UpdateUser, User};
use alchemy_core::repository::UserRepository;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

const USER_SELECT: &str = "SELECT meta::id(id) AS record_id, * FROM";

#[derive(Debug, SurrealValue)]
struct UserRow {
    record_id: String,
    tenant_id: String,
    email: String,
    full_name: String,
    password_hash: Option<String>,
    is_active: bool,
    role: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, DbError> {
        Ok(User {
            id: parse_uuid("user", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            email: self.email,
            full_name: self.full_name,
            password_hash: self.password_hash,
            is_active: self.is_active,
            role: self.role,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash a password with Argon2id. A pepper, if given, is prepended.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Hash(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_string(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| DbError::Hash(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> AlchemyResult<User> {
        let id = Uuid::new_v4();
        let password_hash = input
            .password
            .as_deref()
            .map(|p| hash_password(p, self.pepper.as_deref()))
            .transpose()?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, email = $email, \
                 full_name = $full_name, password_hash = $password_hash, \
                 is_active = true, role = $role; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('user', $id);",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("email", normalize_email(&input.email)))
            .bind(("full_name", input.full_name))
            .bind(("password_hash", password_hash))
            .bind(("role", input.role))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("user", e))?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_id(&self, id: Uuid) -> AlchemyResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!("{USER_SELECT} type::record('user', $id)"))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.try_into_user()?)
    }

    async fn get_by_email(&self, email: &str) -> AlchemyResult<User> {
        let email = normalize_email(email);

        let mut result = self
            .db
            .query(format!("{USER_SELECT} user WHERE email = $email LIMIT 1"))
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> AlchemyResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.last_login_at.is_some() {
            sets.push("last_login_at = $last_login_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}; \
             {USER_SELECT} type::record('user', $id);",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role));
        }
        if let Some(last_login_at) = input.last_login_at {
            builder = builder.bind(("last_login_at", last_login_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("user", e))?;

        let rows: Vec<UserRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.try_into_user()?)
    }

    async fn deactivate(&self, id: Uuid) -> AlchemyResult<()> {
        self.update(
            id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
    }

    async fn list_active(&self, tenant_id: Uuid) -> AlchemyResult<Vec<User>> {
        let mut result = self
            .db
            .query(format!(
                "{USER_SELECT} user \
                 WHERE tenant_id = $tenant_id AND is_active = true \
                 ORDER BY created_at ASC"
            ))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;

        let users = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> Result<bool, DbError> {
        use argon2::PasswordVerifier;

        let input = match pepper {
            Some(p) => format!("{p}{password}"),
            None => password.to_string(),
        };

        let parsed_hash = argon2::PasswordHash::new(hash)
            .map_err(|e| DbError::Hash(format!("invalid hash format: {e}")))?;

        match Argon2::default().verify_password(input.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(DbError::Hash(format!("verify error: {e}"))),
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Correct-Horse-9", None).unwrap();
        assert!(verify_password("Correct-Horse-9", &hash, None).unwrap());
        assert!(!verify_password("wrong", &hash, None).unwrap());
    }

    #[test]
    fn pepper_must_match() {
        let hash = hash_password("Correct-Horse-9", Some("pep")).unwrap();
        assert!(verify_password("Correct-Horse-9", &hash, Some("pep")).unwrap());
        assert!(!verify_password("Correct-Horse-9", &hash, None).unwrap());
    }

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
