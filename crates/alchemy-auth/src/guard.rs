//! Request guard: bearer credential → identity → permission decision.

use alchemy_core::module::PermissionCode;
use alchemy_core::repository::{
    PermissionRepository, RoleRepository, UserRepository, UserRoleRepository,
};
use alchemy_rbac::RbacService;
use tracing::debug;

use crate::error::AuthError;
use crate::service::{AuthService, Identity};
use crate::token;

/// Couples the authentication service with the authorization engine.
///
/// Callers map each request to a [`PermissionCode`] and hand the raw
/// `Authorization` header to [`authorize`](Self::authorize).
pub struct PermissionGuard<U, R, P, A>
where
    U: UserRepository,
    R: RoleRepository,
    P: PermissionRepository,
    A: UserRoleRepository,
{
    auth: AuthService<U>,
    rbac: RbacService<R, P, A>,
}

impl<U, R, P, A> PermissionGuard<U, R, P, A>
where
    U: UserRepository,
    R: RoleRepository,
    P: PermissionRepository,
    A: UserRoleRepository,
{
    pub fn new(auth: AuthService<U>, rbac: RbacService<R, P, A>) -> Self {
        Self { auth, rbac }
    }

    pub fn auth(&self) -> &AuthService<U> {
        &self.auth
    }

    pub fn rbac(&self) -> &RbacService<R, P, A> {
        &self.rbac
    }

    /// Authenticate the caller and require `code`.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        code: &PermissionCode,
    ) -> Result<Identity, AuthError> {
        let identity = self.authenticate(authorization).await?;

        if !self
            .rbac
            .check_code(identity.user_id, identity.tenant_id, code)
            .await
        {
            debug!(
                user_id = %identity.user_id,
                tenant_id = %identity.tenant_id,
                module = %code.module,
                action = %code.action,
                "Request forbidden"
            );
            return Err(AuthError::Forbidden(format!(
                "You do not have permission to {} {}",
                code.action, code.module
            )));
        }

        Ok(identity)
    }

    /// Authenticate the caller without a permission requirement.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let session_token = token::bearer_token(authorization)?;
        self.auth.authenticate(session_token).await
    }
}
