//! First-boot super administrator seeding.
//!
//! A fresh deployment has no account able to create administrators; when
//! `BOOTSTRAP_ADMIN_EMAIL` is set and no active super-admin exists, one is
//! created directly against the store and its API token is logged once.

use muster_application::credential;
use muster_core::{AdminUserId, AppError, AppResult};
use muster_domain::SUPER_ADMIN_ROLE_NAME;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::ApiConfig;

pub async fn ensure_bootstrap_admin(pool: &PgPool, config: &ApiConfig) -> AppResult<()> {
    let Some(email) = config.bootstrap_admin_email.as_deref() else {
        return Ok(());
    };

    let active_super_admins = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM user_role_assignments AS assignments
        INNER JOIN roles
            ON roles.id = assignments.role_id
        INNER JOIN admin_users
            ON admin_users.id = assignments.user_id
        WHERE roles.name = $1
            AND assignments.is_active
            AND admin_users.account_state = 'active'
        "#,
    )
    .bind(SUPER_ADMIN_ROLE_NAME)
    .fetch_one(pool)
    .await
    .map_err(|error| AppError::Unavailable(format!("failed to count super admins: {error}")))?;

    if active_super_admins > 0 {
        info!("active super administrator present, skipping bootstrap");
        return Ok(());
    }

    let role_id = sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM roles WHERE name = $1")
        .bind(SUPER_ADMIN_ROLE_NAME)
        .fetch_one(pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("super_admin role missing after seeding: {error}"))
        })?;

    let (api_token, api_token_hash) = credential::generate_api_token()?;
    let user_id = AdminUserId::new();

    let mut transaction = pool
        .begin()
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to begin transaction: {error}")))?;

    sqlx::query(
        r#"
        INSERT INTO admin_users (id, display_name, email, api_token_hash)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(config.bootstrap_admin_display_name.as_str())
    .bind(email)
    .bind(api_token_hash.as_str())
    .execute(&mut *transaction)
    .await
    .map_err(|error| AppError::Unavailable(format!("failed to create bootstrap admin: {error}")))?;

    sqlx::query(
        r#"
        INSERT INTO user_role_assignments (user_id, role_id, assigned_by)
        VALUES ($1, $2, $1)
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(role_id)
    .execute(&mut *transaction)
    .await
    .map_err(|error| {
        AppError::Unavailable(format!("failed to assign bootstrap role: {error}"))
    })?;

    transaction
        .commit()
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to commit transaction: {error}")))?;

    warn!(
        %user_id,
        email,
        api_token,
        "bootstrap super administrator created; the api token is shown only once"
    );
    Ok(())
}
