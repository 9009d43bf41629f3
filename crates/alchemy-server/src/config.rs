//! Command line and environment configuration.
//!
//! Every setting can be given as a flag or through its `ALCHEMY_*`
//! variable. Boolean settings accept true/t/yes/y/on/1 and
//! false/f/no/n/off/0 in any case; anything else is a parse error.

use alchemy_auth::AuthConfig;
use alchemy_db::DbConfig;
use alchemy_rbac::RbacConfig;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

/// Alchemy RBAC bootstrap: migrations, default tenant, system roles and
/// optional role assignment backfill.
#[derive(Parser, Debug, Clone)]
#[command(name = "alchemy-server")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Map legacy role labels of active users onto assignments.
    #[arg(long)]
    pub backfill: bool,

    /// Refresh assignments that already exist during a backfill.
    #[arg(long, requires = "backfill")]
    pub force: bool,

    // -------------------------------------------------------------------
    // Database
    // -------------------------------------------------------------------
    /// SurrealDB WebSocket endpoint (host:port).
    #[arg(long, env = "ALCHEMY_DB_URL", default_value = "127.0.0.1:8000")]
    pub db_url: String,

    #[arg(long, env = "ALCHEMY_DB_NAMESPACE", default_value = "alchemy")]
    pub db_namespace: String,

    #[arg(long, env = "ALCHEMY_DB_NAME", default_value = "rbac")]
    pub db_name: String,

    #[arg(long, env = "ALCHEMY_DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(
        long,
        env = "ALCHEMY_DB_PASSWORD",
        default_value = "root",
        hide_env_values = true
    )]
    pub db_password: String,

    // -------------------------------------------------------------------
    // Authorization engine
    // -------------------------------------------------------------------
    /// Use a user's assignments from other tenants when none exist in the
    /// requested tenant.
    #[arg(
        long,
        env = "ALCHEMY_TENANT_FALLBACK",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = true
    )]
    pub tenant_fallback: bool,

    /// Inactive roles grant nothing.
    #[arg(
        long,
        env = "ALCHEMY_IGNORE_INACTIVE_ROLES",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = true
    )]
    pub ignore_inactive_roles: bool,

    /// Reject permission updates for modules outside the known registry.
    #[arg(
        long,
        env = "ALCHEMY_STRICT_MODULES",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value_t = false
    )]
    pub strict_modules: bool,

    // -------------------------------------------------------------------
    // Sessions and passwords
    // -------------------------------------------------------------------
    /// Ed25519 private key (PEM) used to sign session tokens.
    #[arg(long, env = "ALCHEMY_JWT_PRIVATE_KEY", default_value = "", hide_env_values = true)]
    pub jwt_private_key: String,

    /// Ed25519 public key (PEM) used to verify session tokens.
    #[arg(long, env = "ALCHEMY_JWT_PUBLIC_KEY", default_value = "")]
    pub jwt_public_key: String,

    /// Session token lifetime in seconds.
    #[arg(
        long,
        env = "ALCHEMY_SESSION_LIFETIME_SECS",
        default_value_t = 86_400,
        value_parser = clap::value_parser!(u64).range(1..=i64::MAX as u64)
    )]
    pub session_lifetime_secs: u64,

    #[arg(long, env = "ALCHEMY_JWT_ISSUER", default_value = "alchemy")]
    pub jwt_issuer: String,

    /// Secret prefixed to passwords before hashing. Empty means none.
    #[arg(long, env = "ALCHEMY_PASSWORD_PEPPER", hide_env_values = true)]
    pub password_pepper: Option<String>,

    #[arg(long, env = "ALCHEMY_MIN_PASSWORD_LENGTH", default_value_t = 12)]
    pub min_password_length: usize,
}

impl Cli {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_name.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn rbac_config(&self) -> RbacConfig {
        RbacConfig {
            tenant_fallback: self.tenant_fallback,
            ignore_inactive_roles: self.ignore_inactive_roles,
            strict_modules: self.strict_modules,
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_private_key_pem: self.jwt_private_key.clone(),
            jwt_public_key_pem: self.jwt_public_key.clone(),
            session_lifetime_secs: self.session_lifetime_secs,
            jwt_issuer: self.jwt_issuer.clone(),
            pepper: self.password_pepper.clone().filter(|p| !p.is_empty()),
            min_password_length: self.min_password_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("alchemy-server").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_library_defaults() {
        let cli = parse(&[]).unwrap();

        let rbac = RbacConfig::default();
        let parsed = cli.rbac_config();
        assert_eq!(parsed.tenant_fallback, rbac.tenant_fallback);
        assert_eq!(parsed.ignore_inactive_roles, rbac.ignore_inactive_roles);
        assert_eq!(parsed.strict_modules, rbac.strict_modules);

        let auth = AuthConfig::default();
        let parsed = cli.auth_config();
        assert_eq!(parsed.session_lifetime_secs, auth.session_lifetime_secs);
        assert_eq!(parsed.jwt_issuer, auth.jwt_issuer);
        assert_eq!(parsed.min_password_length, auth.min_password_length);
        assert!(parsed.pepper.is_none());

        let db = DbConfig::default();
        let parsed = cli.db_config();
        assert_eq!(parsed.url, db.url);
        assert_eq!(parsed.namespace, db.namespace);
        assert_eq!(parsed.database, db.database);
        assert_eq!(parsed.username, db.username);
    }

    #[test]
    fn boolean_settings_accept_common_spellings() {
        for (raw, expected) in [("no", false), ("off", false), ("0", false), ("YES", true), ("t", true)] {
            let cli = parse(&["--tenant-fallback", raw]).unwrap();
            assert_eq!(cli.rbac_config().tenant_fallback, expected, "{raw}");
        }
    }

    #[test]
    fn unrecognised_boolean_is_rejected() {
        let err = parse(&["--tenant-fallback", "maybe"]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidValue | ErrorKind::ValueValidation
        ));
    }

    #[test]
    fn misspelled_switch_is_rejected() {
        let err = parse(&["--backfil", "--force"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn force_requires_backfill() {
        let err = parse(&["--force"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = parse(&["--backfill", "--force"]).unwrap();
        assert!(cli.backfill && cli.force);
    }

    #[test]
    fn session_lifetime_must_fit_a_timestamp() {
        assert!(parse(&["--session-lifetime-secs", "0"]).is_err());
        assert!(parse(&["--session-lifetime-secs", "18446744073709551615"]).is_err());
        let cli = parse(&["--session-lifetime-secs", "3600"]).unwrap();
        assert_eq!(cli.auth_config().session_lifetime_secs, 3600);
    }

    #[test]
    fn empty_pepper_means_none() {
        let cli = parse(&["--password-pepper", ""]).unwrap();
        assert!(cli.auth_config().pepper.is_none());

        let cli = parse(&["--password-pepper", "s3cret", "--min-password-length", "16"]).unwrap();
        let auth = cli.auth_config();
        assert_eq!(auth.pepper.as_deref(), Some("s3cret"));
        assert_eq!(auth.min_password_length, 16);
    }
}
