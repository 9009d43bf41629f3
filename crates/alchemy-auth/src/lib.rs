//! Alchemy Auth: password login, EdDSA session tokens and the request
//! guard that couples identity with the authorization engine.

pub mod config;
pub mod error;
pub mod guard;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use guard::PermissionGuard;
pub use service::{AuthService, Identity, LoginInput, LoginOutput};
pub use token::SessionClaims;
