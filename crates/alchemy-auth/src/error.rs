//! Authentication and request-guard error types.

use alchemy_core::error::AlchemyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("Your account is inactive. Please contact your administrator.")]
    AccountInactive,

    #[error(
        "No password set for this account. Please use SSO login or contact your administrator."
    )]
    NoPasswordSet,

    #[error("{0}")]
    WeakPassword(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("missing or malformed authorization header")]
    MissingCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error(transparent)]
    Storage(#[from] AlchemyError),
}

impl AuthError {
    /// Whether the caller should answer 401 rather than 403.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::AccountInactive
                | AuthError::NoPasswordSet
                | AuthError::TokenExpired
                | AuthError::TokenInvalid(_)
                | AuthError::MissingCredentials
        )
    }
}

impl From<AuthError> for AlchemyError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(reason) => AlchemyError::AuthorizationDenied { reason },
            AuthError::WeakPassword(message) => AlchemyError::Validation { message },
            AuthError::Crypto(msg) => AlchemyError::Crypto(msg),
            AuthError::Storage(inner) => inner,
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::NoPasswordSet
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::MissingCredentials => AlchemyError::AuthenticationFailed {
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_maps_to_authorization_denied() {
        let err: AlchemyError = AuthError::Forbidden("nope".into()).into();
        assert!(matches!(err, AlchemyError::AuthorizationDenied { reason } if reason == "nope"));
        assert!(!AuthError::Forbidden(String::new()).is_unauthenticated());
        assert!(AuthError::TokenExpired.is_unauthenticated());
    }
}
