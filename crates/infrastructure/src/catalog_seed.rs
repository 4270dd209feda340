use std::str::FromStr;

use sqlx::PgPool;

use muster_core::{AppError, AppResult};
use muster_domain::{Permission, SUPER_ADMIN_ROLE_NAME};

use crate::map_store_error;

/// Seeds the permission catalog and the `super_admin` system role.
///
/// Permissions are never created through the API; this is the single write
/// path into the catalog. Seeding is idempotent and never clobbers display
/// fields edited by operators. Every stored permission name is re-validated
/// against the closed enumeration so a typo fails at startup instead of
/// silently granting nothing at check time.
pub async fn seed_security_catalog(pool: &PgPool) -> AppResult<()> {
    let mut seeded = 0u32;
    for permission in Permission::all() {
        let inserted = sqlx::query(
            r#"
            INSERT INTO permissions (name, display_name, description, category)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(permission.as_str())
        .bind(permission.default_display_name())
        .bind(permission.default_description())
        .bind(permission.category().as_str())
        .execute(pool)
        .await
        .map_err(|error| map_store_error(error, "failed to seed permission catalog"))?
        .rows_affected();
        seeded += inserted as u32;
    }

    verify_catalog(pool).await?;

    sqlx::query(
        r#"
        INSERT INTO roles (name, display_name, description, is_system_role)
        VALUES ($1, 'Super Administrator', 'Holds every capability and manages administrators.', TRUE)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(SUPER_ADMIN_ROLE_NAME)
    .execute(pool)
    .await
    .map_err(|error| map_store_error(error, "failed to seed super_admin role"))?;

    // The super_admin grant set is system-managed; keep it complete even
    // when new permissions are introduced by an upgrade.
    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT roles.id, permissions.id
        FROM roles
        CROSS JOIN permissions
        WHERE roles.name = $1
        ON CONFLICT (role_id, permission_id) DO NOTHING
        "#,
    )
    .bind(SUPER_ADMIN_ROLE_NAME)
    .execute(pool)
    .await
    .map_err(|error| map_store_error(error, "failed to seed super_admin grants"))?;

    tracing::info!(
        seeded,
        total = Permission::all().len(),
        "security catalog seeded"
    );
    Ok(())
}

/// Rejects startup when the stored catalog contains a name the closed
/// enumeration no longer recognizes.
async fn verify_catalog(pool: &PgPool) -> AppResult<()> {
    let names = sqlx::query_scalar::<_, String>("SELECT name FROM permissions")
        .fetch_all(pool)
        .await
        .map_err(|error| map_store_error(error, "failed to verify permission catalog"))?;

    for name in names {
        if Permission::from_str(name.as_str()).is_err() {
            return Err(AppError::Validation(format!(
                "permission catalog contains unrecognized name '{name}'"
            )));
        }
    }

    Ok(())
}
