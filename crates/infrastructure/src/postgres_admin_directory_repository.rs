use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use muster_application::{
    AdminDirectoryRepository, AdminIdentityRecord, NewAdminIdentity, RoleSummary,
};
use muster_core::{AdminUserId, AppError, AppResult};
use muster_domain::{AccountState, Permission, RoleId};

use crate::map_store_error;

/// PostgreSQL-backed repository for administrative identities and lifecycle
/// writes.
///
/// Every mutation runs as one transaction; role replacement and deactivation
/// serialize on the identity row so concurrent updates to the same account
/// cannot interleave.
#[derive(Clone)]
pub struct PostgresAdminDirectoryRepository {
    pool: PgPool,
}

impl PostgresAdminDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AdminRow {
    id: uuid::Uuid,
    display_name: String,
    email: String,
    account_state: String,
    created_at: String,
}

impl AdminRow {
    fn into_record(self) -> AppResult<AdminIdentityRecord> {
        let state = AccountState::from_str(self.account_state.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode account state for '{}': {error}",
                self.id
            ))
        })?;

        Ok(AdminIdentityRecord {
            user_id: AdminUserId::from_uuid(self.id),
            display_name: self.display_name,
            email: self.email,
            state,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RoleSummaryRow {
    role_id: uuid::Uuid,
    name: String,
    display_name: String,
}

const ADMIN_COLUMNS: &str = r#"
    id,
    display_name,
    email,
    account_state,
    to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
"#;

#[async_trait]
impl AdminDirectoryRepository for PostgresAdminDirectoryRepository {
    async fn create_admin(
        &self,
        identity: NewAdminIdentity,
        role_ids: &[RoleId],
        permissions: &[Permission],
        assigned_by: AdminUserId,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO admin_users (id, display_name, email, api_token_hash)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(identity.user_id.as_uuid())
        .bind(identity.display_name.as_str())
        .bind(identity.email.as_str())
        .bind(identity.api_token_hash.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to create administrator identity"))?;

        for role_id in role_ids {
            sqlx::query(
                r#"
                INSERT INTO user_role_assignments (user_id, role_id, assigned_by)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(identity.user_id.as_uuid())
            .bind(role_id.as_uuid())
            .bind(assigned_by.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to persist role assignment"))?;
        }

        for permission in permissions {
            let inserted = sqlx::query(
                r#"
                INSERT INTO user_permission_grants (user_id, permission_id, granted_by)
                SELECT $1, permissions.id, $3
                FROM permissions
                WHERE permissions.name = $2
                "#,
            )
            .bind(identity.user_id.as_uuid())
            .bind(permission.as_str())
            .bind(assigned_by.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to persist direct grant"))?
            .rows_affected();

            if inserted == 0 {
                return Err(AppError::Internal(format!(
                    "permission '{}' is missing from the catalog",
                    permission.as_str()
                )));
            }
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit transaction"))
    }

    async fn find_admin(&self, user_id: AdminUserId) -> AppResult<Option<AdminIdentityRecord>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to load administrator"))?;

        row.map(AdminRow::into_record).transpose()
    }

    async fn find_admin_by_token_hash(
        &self,
        api_token_hash: &str,
    ) -> AppResult<Option<AdminIdentityRecord>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE api_token_hash = $1"
        ))
        .bind(api_token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to resolve credential"))?;

        row.map(AdminRow::into_record).transpose()
    }

    async fn list_admins(&self) -> AppResult<Vec<AdminIdentityRecord>> {
        let rows = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users ORDER BY display_name, email"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to list administrators"))?;

        rows.into_iter().map(AdminRow::into_record).collect()
    }

    async fn list_active_roles(&self, user_id: AdminUserId) -> AppResult<Vec<RoleSummary>> {
        let rows = sqlx::query_as::<_, RoleSummaryRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name,
                roles.display_name
            FROM user_role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
            WHERE assignments.user_id = $1
                AND assignments.is_active
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to list active roles"))?;

        Ok(rows
            .into_iter()
            .map(|row| RoleSummary {
                role_id: RoleId::from_uuid(row.role_id),
                name: row.name,
                display_name: row.display_name,
            })
            .collect())
    }

    async fn replace_admin_roles(
        &self,
        user_id: AdminUserId,
        new_role_ids: &[RoleId],
        assigned_by: AdminUserId,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        // Row lock on the identity serializes concurrent replacements; the
        // last writer replaces the full set, no merge.
        sqlx::query_scalar::<_, uuid::Uuid>(
            "SELECT id FROM admin_users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to lock administrator row"))?
        .ok_or_else(|| AppError::NotFound(format!("administrator '{user_id}' was not found")))?;

        let kept_role_ids: Vec<uuid::Uuid> =
            new_role_ids.iter().map(|role_id| role_id.as_uuid()).collect();

        sqlx::query(
            r#"
            UPDATE user_role_assignments
            SET is_active = FALSE
            WHERE user_id = $1
                AND is_active
                AND role_id <> ALL($2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&kept_role_ids)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to deactivate role assignments"))?;

        for role_id in new_role_ids {
            sqlx::query(
                r#"
                INSERT INTO user_role_assignments (user_id, role_id, assigned_by)
                SELECT $1, $2, $3
                WHERE NOT EXISTS (
                    SELECT 1
                    FROM user_role_assignments
                    WHERE user_id = $1
                        AND role_id = $2
                        AND is_active
                )
                "#,
            )
            .bind(user_id.as_uuid())
            .bind(role_id.as_uuid())
            .bind(assigned_by.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to persist role assignment"))?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit transaction"))
    }

    async fn deactivate_admin(&self, user_id: AdminUserId) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        let account_state = sqlx::query_scalar::<_, String>(
            "SELECT account_state FROM admin_users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to lock administrator row"))?
        .ok_or_else(|| AppError::NotFound(format!("administrator '{user_id}' was not found")))?;

        if account_state == AccountState::Deactivated.as_str() {
            return Err(AppError::Conflict(format!(
                "account '{user_id}' is already deactivated"
            )));
        }

        sqlx::query(
            "UPDATE user_role_assignments SET is_active = FALSE WHERE user_id = $1 AND is_active",
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to deactivate role assignments"))?;

        sqlx::query(
            "UPDATE user_permission_grants SET is_active = FALSE WHERE user_id = $1 AND is_active",
        )
        .bind(user_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to deactivate direct grants"))?;

        sqlx::query("UPDATE admin_users SET account_state = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(AccountState::Deactivated.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to mark account deactivated"))?;

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit transaction"))
    }
}
