use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use muster_application::AuthorizationRepository;
use muster_core::{AdminUserId, AppResult};

use crate::map_store_error;

/// PostgreSQL-backed repository for the permission resolution read paths.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NameRow {
    name: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_role_permission_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>> {
        let rows = sqlx::query_as::<_, NameRow>(
            r#"
            SELECT DISTINCT permissions.name
            FROM user_role_assignments AS assignments
            INNER JOIN role_permissions AS role_grants
                ON role_grants.role_id = assignments.role_id
            INNER JOIN permissions
                ON permissions.id = role_grants.permission_id
            WHERE assignments.user_id = $1
                AND assignments.is_active
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to load role permissions"))?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn list_direct_grant_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>> {
        let rows = sqlx::query_as::<_, NameRow>(
            r#"
            SELECT DISTINCT permissions.name
            FROM user_permission_grants AS grants
            INNER JOIN permissions
                ON permissions.id = grants.permission_id
            WHERE grants.user_id = $1
                AND grants.is_active
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to load direct grants"))?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }

    async fn list_active_role_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>> {
        let rows = sqlx::query_as::<_, NameRow>(
            r#"
            SELECT DISTINCT roles.name
            FROM user_role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
            WHERE assignments.user_id = $1
                AND assignments.is_active
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to load active roles"))?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }
}
