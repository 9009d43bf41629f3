//! Authentication service: login and token authentication.

use alchemy_core::models::user::UpdateUser;
use alchemy_core::repository::UserRepository;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed EdDSA session token.
    pub access_token: String,
    /// Session token lifetime in seconds.
    pub expires_in: u64,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    /// No earlier login is on record.
    pub first_login: bool,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
}

/// Authentication service.
///
/// Generic over the user repository so that the auth layer has no
/// dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate with email + password and issue a session token.
    ///
    /// Inactive accounts and accounts without a password are refused with
    /// their own errors before the password is looked at.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AuthError> {
        // 1. Look up user (case-insensitive email).
        let user = match self.user_repo.get_by_email(&input.email).await {
            Ok(u) => u,
            Err(e) if e.is_not_found() => {
                debug!("Login for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        // 2. Check account state.
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::NoPasswordSet);
        };

        // 3. Verify password.
        if !password::verify_password(&input.password, hash, self.config.pepper.as_deref())? {
            debug!(user_id = %user.id, "Password verification failed");
            return Err(AuthError::InvalidCredentials);
        }

        // 4. Record the login and issue the token.
        self.user_repo
            .update(
                user.id,
                UpdateUser {
                    last_login_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        let access_token =
            token::issue_session_token(user.id, user.tenant_id, &user.email, &self.config)?;

        info!(user_id = %user.id, tenant_id = %user.tenant_id, "Login succeeded");
        Ok(LoginOutput {
            access_token,
            expires_in: self.config.session_lifetime_secs,
            user_id: user.id,
            tenant_id: user.tenant_id,
            first_login: user.last_login_at.is_none(),
        })
    }

    /// Resolve a session token to the identity of an active user.
    ///
    /// The tenant comes from the user record, not the token, so a user
    /// moved between tenants is checked against the current one.
    pub async fn authenticate(&self, session_token: &str) -> Result<Identity, AuthError> {
        let claims = token::decode_session_token(session_token, &self.config)?;
        let user_id = claims.user_id()?;
        let token_tenant_id = claims.tenant_id()?;

        let user = match self.user_repo.get_by_id(user_id).await {
            Ok(u) => u,
            Err(e) if e.is_not_found() => {
                return Err(AuthError::TokenInvalid("unknown subject".into()));
            }
            Err(e) => return Err(e.into()),
        };
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }
        if token_tenant_id != user.tenant_id {
            debug!(
                %user_id,
                %token_tenant_id,
                tenant_id = %user.tenant_id,
                "Session issued for another tenant, using the current one"
            );
        }

        Ok(Identity {
            user_id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
        })
    }

    /// Apply the password policy to a candidate password.
    pub fn validate_new_password(&self, password: &str) -> Result<(), AuthError> {
        password::validate_password_strength(password, self.config.min_password_length)
    }
}
