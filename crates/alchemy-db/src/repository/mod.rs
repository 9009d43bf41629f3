//! SurrealDB repository implementations.

mod permission;
mod role;
mod tenant;
mod user;
mod user_role;

pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;
pub use user_role::SurrealUserRoleRepository;

use uuid::Uuid;

use crate::error::DbError;

/// Parse a UUID column, naming the column in the error.
pub(crate) fn parse_uuid(column: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::InvalidRecord(format!("invalid {column} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(column: &str, raw: Option<&str>) -> Result<Option<Uuid>, DbError> {
    raw.map(|r| parse_uuid(column, r)).transpose()
}
