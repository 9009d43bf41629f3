//! Authorization engine error types.

use alchemy_core::error::AlchemyError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RbacError {
    #[error("role {role_id} is not assigned to user {user_id} in tenant {tenant_id}")]
    AssignmentNotFound {
        user_id: Uuid,
        role_id: Uuid,
        tenant_id: Uuid,
    },

    #[error(
        "failed to remove role {role_id} from user {user_id} in tenant {tenant_id}: \
         assignment still present after delete"
    )]
    DeleteNotApplied {
        user_id: Uuid,
        role_id: Uuid,
        tenant_id: Uuid,
    },

    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] AlchemyError),
}

impl From<RbacError> for AlchemyError {
    fn from(err: RbacError) -> Self {
        match err {
            RbacError::AssignmentNotFound { .. } => AlchemyError::NotFound {
                entity: "user_role".into(),
                id: err.to_string(),
            },
            RbacError::RoleNotFound(id) => AlchemyError::NotFound {
                entity: "role".into(),
                id,
            },
            RbacError::Validation(message) => AlchemyError::Validation { message },
            RbacError::DeleteNotApplied { .. } => AlchemyError::Internal(err.to_string()),
            RbacError::Storage(inner) => inner,
        }
    }
}
