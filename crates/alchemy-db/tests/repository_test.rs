//! Integration tests for the RBAC repositories using in-memory SurrealDB.

use alchemy_core::error::AlchemyError;
use alchemy_core::models::permission::{Action, PermissionFlags, UpsertPermission};
use alchemy_core::models::role::{CreateRole, UpdateRole};
use alchemy_core::models::tenant::CreateTenant;
use alchemy_core::models::user::{CreateUser, UpdateUser};
use alchemy_core::models::user_role::CreateUserRole;
use alchemy_core::repository::{
    PermissionRepository, RoleRepository, TenantRepository, UserRepository, UserRoleRepository,
};
use alchemy_db::repository::{
    SurrealPermissionRepository, SurrealRoleRepository, SurrealTenantRepository,
    SurrealUserRepository, SurrealUserRoleRepository,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create one tenant.
async fn setup() -> (Surreal<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    alchemy_db::run_migrations(&db).await.unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            id: None,
            name: "Acme".into(),
            slug: "acme".into(),
        })
        .await
        .unwrap();

    (db, tenant.id)
}

async fn create_role(db: &Surreal<Db>, tenant_id: Uuid, name: &str) -> Uuid {
    SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            tenant_id,
            role_name: name.into(),
            role_description: None,
            is_system_role: false,
            created_by: None,
        })
        .await
        .unwrap()
        .id
}

// ---------------------------------------------------------------------------
// Tenants and users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tenant_lookup_by_id_and_slug() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealTenantRepository::new(db);

    assert_eq!(repo.get_by_id(tenant_id).await.unwrap().slug, "acme");
    assert_eq!(repo.get_by_slug("acme").await.unwrap().id, tenant_id);
    assert!(repo.get_by_slug("nope").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn tenant_with_fixed_id() {
    let (db, _) = setup().await;
    let repo = SurrealTenantRepository::new(db);
    let fixed = Uuid::from_u128(42);

    let tenant = repo
        .create(CreateTenant {
            id: Some(fixed),
            name: "Fixed".into(),
            slug: "fixed".into(),
        })
        .await
        .unwrap();
    assert_eq!(tenant.id, fixed);
}

#[tokio::test]
async fn user_email_is_case_insensitive() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(CreateUser {
            tenant_id,
            email: "Alice@Example.com".into(),
            full_name: "Alice".into(),
            password: Some("Sup3r-Secret-Pass".into()),
            role: Some("Admin".into()),
        })
        .await
        .unwrap();
    assert_eq!(user.email, "alice@example.com");

    let found = repo.get_by_email("ALICE@example.COM").await.unwrap();
    assert_eq!(found.id, user.id);
    let hash = PasswordHash::new(found.password_hash.as_deref().unwrap()).unwrap();
    assert_eq!(hash.algorithm.as_str(), "argon2id");
    assert!(
        Argon2::default()
            .verify_password(b"Sup3r-Secret-Pass", &hash)
            .is_ok()
    );

    let dup = repo
        .create(CreateUser {
            tenant_id,
            email: "alice@EXAMPLE.com".into(),
            full_name: "Other".into(),
            password: None,
            role: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(dup, AlchemyError::AlreadyExists { .. }));
}

#[tokio::test]
async fn user_update_and_deactivate() {
    let (db, tenant_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(CreateUser {
            tenant_id,
            email: "bob@example.com".into(),
            full_name: "Bob".into(),
            password: None,
            role: None,
        })
        .await
        .unwrap();
    assert!(user.password_hash.is_none());

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                role: Some(Some("Contributor".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role.as_deref(), Some("Contributor"));

    repo.deactivate(user.id).await.unwrap();
    assert!(!repo.get_by_id(user.id).await.unwrap().is_active);
    assert!(repo.list_active(tenant_id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn role_crud() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealRoleRepository::new(db);

    let role = repo.get_by_id(tenant_id, role_id).await.unwrap();
    assert_eq!(role.role_name, "Editor");
    assert!(role.is_active);

    assert_eq!(
        repo.get_by_name(tenant_id, "Editor").await.unwrap().unwrap().id,
        role_id
    );
    assert!(repo.get_by_name(tenant_id, "editor").await.unwrap().is_none());

    let updated = repo
        .update(
            tenant_id,
            role_id,
            UpdateRole {
                role_description: Some(Some("Edits things".into())),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role_description.as_deref(), Some("Edits things"));
    assert!(!updated.is_active);
    assert!(repo.list_active(tenant_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn role_names_are_unique_per_tenant() {
    let (db, tenant_id) = setup().await;
    create_role(&db, tenant_id, "Editor").await;

    let err = SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            tenant_id,
            role_name: "Editor".into(),
            role_description: None,
            is_system_role: false,
            created_by: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AlchemyError::AlreadyExists { .. }));

    // Same name in another tenant is fine.
    create_role(&db, Uuid::new_v4(), "Editor").await;
}

#[tokio::test]
async fn role_lookup_is_tenant_scoped() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealRoleRepository::new(db);

    let other = Uuid::new_v4();
    assert!(repo.get_by_id(other, role_id).await.unwrap_err().is_not_found());
    // The unscoped lookup still resolves it.
    assert!(repo.find_by_id(role_id).await.unwrap().is_some());
    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn permission_upsert_keeps_one_row() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealPermissionRepository::new(db);

    let first = repo
        .upsert(UpsertPermission {
            tenant_id,
            role_id,
            module_name: "Tasks".into(),
            flags: PermissionFlags::none().with(Action::Retrieve),
        })
        .await
        .unwrap();

    let second = repo
        .upsert(UpsertPermission {
            tenant_id,
            role_id,
            module_name: "tasks".into(),
            flags: PermissionFlags::none().with(Action::Update),
        })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.flags.can_update);
    assert!(!second.flags.can_retrieve);

    let rows = repo.get_role_permissions(tenant_id, role_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    // The originally entered spelling is kept.
    assert_eq!(rows[0].module_name, "Tasks");
}

#[tokio::test]
async fn permission_find_ignores_module_case() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealPermissionRepository::new(db);

    repo.upsert(UpsertPermission {
        tenant_id,
        role_id,
        module_name: "Security_Controls".into(),
        flags: PermissionFlags::all(),
    })
    .await
    .unwrap();

    let found = repo
        .find(tenant_id, role_id, "security_controls")
        .await
        .unwrap()
        .unwrap();
    assert!(found.allows(Action::CreateTask));
    assert!(repo.find(Uuid::new_v4(), role_id, "security_controls").await.unwrap().is_none());
}

#[tokio::test]
async fn permission_textual_flags_are_normalized() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Legacy").await;

    db.query(
        "CREATE permission SET tenant_id = $tenant_id, role_id = $role_id, \
         module_name = 'Audits', module_key = 'audits', \
         can_create = 'yes', can_retrieve = 'true', can_update = 'false', \
         can_delete = 1, can_comment = 0, can_create_task = 'T'",
    )
    .bind(("tenant_id", tenant_id.to_string()))
    .bind(("role_id", role_id.to_string()))
    .await
    .unwrap()
    .check()
    .unwrap();

    let found = SurrealPermissionRepository::new(db)
        .find(tenant_id, role_id, "audits")
        .await
        .unwrap()
        .unwrap();
    assert!(found.flags.can_create);
    assert!(found.flags.can_retrieve);
    assert!(!found.flags.can_update);
    assert!(found.flags.can_delete);
    assert!(!found.flags.can_comment);
    assert!(found.flags.can_create_task);
}

#[tokio::test]
async fn concurrent_upserts_converge() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealPermissionRepository::new(db);

    let writes = (0..8).map(|i| {
        let repo = repo.clone();
        tokio::spawn(async move {
            let flags = if i % 2 == 0 {
                PermissionFlags::all()
            } else {
                PermissionFlags::none()
            };
            repo.upsert(UpsertPermission {
                tenant_id,
                role_id,
                module_name: "Users".into(),
                flags,
            })
            .await
        })
    });
    let mut succeeded = 0;
    for handle in writes.collect::<Vec<_>>() {
        // A writer may lose a transaction conflict; it must never add a row.
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert!(succeeded > 0);

    let rows = repo.get_role_permissions(tenant_id, role_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    let flags = rows[0].flags;
    assert!(flags == PermissionFlags::all() || flags == PermissionFlags::none());
}

// ---------------------------------------------------------------------------
// User-role assignments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_role_insert_is_unique() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealUserRoleRepository::new(db);
    let user_id = Uuid::new_v4();

    let input = CreateUserRole {
        user_id,
        role_id,
        tenant_id,
        assigned_by: None,
    };
    repo.insert(input.clone()).await.unwrap();
    let err = repo.insert(input).await.unwrap_err();
    assert!(matches!(err, AlchemyError::AlreadyExists { .. }));

    assert!(repo.exists(user_id, role_id, tenant_id).await.unwrap());
    assert_eq!(repo.list_for_user(user_id, Some(tenant_id)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn user_role_tenant_filter() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealUserRoleRepository::new(db);
    let user_id = Uuid::new_v4();

    repo.insert(CreateUserRole {
        user_id,
        role_id,
        tenant_id,
        assigned_by: Some(Uuid::new_v4()),
    })
    .await
    .unwrap();

    assert!(repo.list_for_user(user_id, Some(Uuid::new_v4())).await.unwrap().is_empty());
    let all = repo.list_for_user(user_id, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].assigned_by.is_some());
}

#[tokio::test]
async fn user_role_delete_and_touch() {
    let (db, tenant_id) = setup().await;
    let role_id = create_role(&db, tenant_id, "Editor").await;
    let repo = SurrealUserRoleRepository::new(db);
    let user_id = Uuid::new_v4();

    let created = repo
        .insert(CreateUserRole {
            user_id,
            role_id,
            tenant_id,
            assigned_by: None,
        })
        .await
        .unwrap();

    repo.touch(user_id, role_id, tenant_id).await.unwrap();
    let touched = repo.list_for_user(user_id, None).await.unwrap();
    assert!(touched[0].assigned_at >= created.assigned_at);

    assert_eq!(repo.delete(user_id, role_id, tenant_id).await.unwrap(), 1);
    assert_eq!(repo.delete(user_id, role_id, tenant_id).await.unwrap(), 0);
    assert!(!repo.exists(user_id, role_id, tenant_id).await.unwrap());
}
