//! Database-specific error types and conversions.

use alchemy_core::error::AlchemyError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unique constraint violated on {entity}: {detail}")]
    Duplicate { entity: String, detail: String },

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify a failed statement, separating unique-index violations
    /// from every other query error.
    pub(crate) fn from_statement(entity: &str, err: impl std::fmt::Display) -> Self {
        let detail = err.to_string();
        if detail.contains("already contains") || detail.contains("already exists") {
            DbError::Duplicate {
                entity: entity.into(),
                detail,
            }
        } else {
            DbError::Query(detail)
        }
    }
}

impl From<DbError> for AlchemyError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AlchemyError::NotFound { entity, id },
            DbError::Duplicate { entity, .. } => AlchemyError::AlreadyExists { entity },
            DbError::Hash(msg) => AlchemyError::Crypto(msg),
            other => AlchemyError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_violations_become_already_exists() {
        let err = DbError::from_statement(
            "role",
            "Database index `idx_role_tenant_name` already contains ['t', 'Viewer']",
        );
        assert!(matches!(
            AlchemyError::from(err),
            AlchemyError::AlreadyExists { entity } if entity == "role"
        ));
    }

    #[test]
    fn other_failures_stay_database_errors() {
        let err = DbError::from_statement("role", "Parse error");
        assert!(matches!(AlchemyError::from(err), AlchemyError::Database(_)));
    }
}
