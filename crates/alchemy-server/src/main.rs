//! Alchemy Server: bootstrap entry point.
//!
//! Applies migrations, makes sure the default tenant and its system roles
//! exist, and optionally backfills role assignments from legacy labels
//! (`--backfill [--force]`). Run with `--help` for every setting and its
//! `ALCHEMY_*` variable.

mod config;

use std::process::ExitCode;

use alchemy_core::error::{AlchemyError, AlchemyResult};
use alchemy_core::models::tenant::{CreateTenant, DEFAULT_TENANT_ID};
use alchemy_core::repository::{TenantRepository, UserRepository};
use alchemy_db::repository::{
    SurrealPermissionRepository, SurrealRoleRepository, SurrealTenantRepository,
    SurrealUserRepository, SurrealUserRoleRepository,
};
use alchemy_db::DbManager;
use alchemy_rbac::RbacService;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use crate::config::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = match "alchemy=info".parse::<Directive>() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("invalid log directive: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .json()
        .init();

    info!("Starting Alchemy bootstrap...");

    match run(cli).await {
        Ok(()) => {
            info!("Alchemy bootstrap finished.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Alchemy bootstrap failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AlchemyResult<()> {
    let db_config = cli.db_config();
    let rbac_config = cli.rbac_config();
    let auth_config = cli.auth_config();

    if auth_config.jwt_private_key_pem.is_empty() || auth_config.jwt_public_key_pem.is_empty() {
        warn!("Session signing keys not set; logins will fail until ALCHEMY_JWT_* is configured");
    }
    if !rbac_config.tenant_fallback {
        info!("Cross-tenant role fallback disabled");
    }

    let manager = DbManager::connect_and_migrate(&db_config).await?;
    let db = manager.client();

    ensure_default_tenant(&SurrealTenantRepository::new(db.clone())).await?;

    let rbac = RbacService::new(
        SurrealRoleRepository::new(db.clone()),
        SurrealPermissionRepository::new(db.clone()),
        SurrealUserRoleRepository::new(db.clone()),
        rbac_config,
    );
    let roles = rbac.seed_system_roles(DEFAULT_TENANT_ID).await?;
    info!(tenant_id = %DEFAULT_TENANT_ID, roles = roles.len(), "System roles ready");

    if cli.backfill {
        let user_repo = match auth_config.pepper.clone() {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper),
            None => SurrealUserRepository::new(db.clone()),
        };
        let users = user_repo.list_active(DEFAULT_TENANT_ID).await?;
        let report = rbac
            .backfill_user_roles(&users, DEFAULT_TENANT_ID, cli.force)
            .await;
        if report.errors > 0 {
            warn!(errors = report.errors, "Some users could not be backfilled");
        }
    }

    Ok(())
}

async fn ensure_default_tenant<T: TenantRepository>(tenants: &T) -> AlchemyResult<()> {
    match tenants.get_by_id(DEFAULT_TENANT_ID).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            let created = tenants
                .create(CreateTenant {
                    id: Some(DEFAULT_TENANT_ID),
                    name: "Default".into(),
                    slug: "default".into(),
                })
                .await;
            match created {
                Ok(tenant) => {
                    info!(tenant_id = %tenant.id, "Default tenant created");
                    Ok(())
                }
                Err(AlchemyError::AlreadyExists { .. }) => Ok(()),
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}
