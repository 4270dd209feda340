use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use muster_application::{
    CreateRoleInput, PermissionDescriptor, RoleCatalogRepository, RoleDefinition, UpdateRoleInput,
};
use muster_core::{AppError, AppResult};
use muster_domain::{Permission, RoleId};

use crate::map_store_error;

/// PostgreSQL-backed repository for the role and permission catalog.
#[derive(Clone)]
pub struct PostgresRoleCatalogRepository {
    pool: PgPool,
}

impl PostgresRoleCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    display_name: String,
    description: String,
    is_system_role: bool,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    name: String,
    display_name: String,
    description: String,
}

impl PermissionRow {
    fn into_descriptor(self) -> Option<PermissionDescriptor> {
        match Permission::from_str(self.name.as_str()) {
            Ok(permission) => Some(PermissionDescriptor {
                permission,
                display_name: self.display_name,
                description: self.description,
                category: permission.category(),
            }),
            Err(_) => {
                tracing::warn!(
                    permission = self.name.as_str(),
                    "skipping unrecognized permission row in catalog listing"
                );
                None
            }
        }
    }
}

/// Folds joined role/grant rows into role definitions, preserving the
/// row order of the query.
fn aggregate_roles(rows: Vec<RoleRow>) -> Vec<RoleDefinition> {
    let mut roles: Vec<RoleDefinition> = Vec::new();
    for row in rows {
        let role_id = RoleId::from_uuid(row.role_id);
        if roles.last().map(|role| role.role_id) != Some(role_id) {
            roles.push(RoleDefinition {
                role_id,
                name: row.role_name,
                display_name: row.display_name,
                description: row.description,
                is_system_role: row.is_system_role,
                permissions: Vec::new(),
            });
        }

        let Some(name) = row.permission else {
            continue;
        };
        match Permission::from_str(name.as_str()) {
            Ok(permission) => {
                if let Some(role) = roles.last_mut() {
                    role.permissions.push(permission);
                }
            }
            Err(_) => {
                tracing::warn!(
                    permission = name.as_str(),
                    "skipping unrecognized permission attached to role"
                );
            }
        }
    }

    roles
}

const ROLE_QUERY: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.name AS role_name,
        roles.display_name,
        roles.description,
        roles.is_system_role,
        grants.permission
    FROM roles
    LEFT JOIN (
        SELECT role_permissions.role_id, permissions.name AS permission
        FROM role_permissions
        INNER JOIN permissions
            ON permissions.id = role_permissions.permission_id
    ) AS grants
        ON grants.role_id = roles.id
"#;

#[async_trait]
impl RoleCatalogRepository for PostgresRoleCatalogRepository {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "{ROLE_QUERY} ORDER BY roles.name, grants.permission"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to list roles"))?;

        Ok(aggregate_roles(rows))
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!(
            "{ROLE_QUERY} WHERE roles.id = $1 ORDER BY grants.permission"
        ))
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to load role"))?;

        Ok(aggregate_roles(rows).into_iter().next())
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO roles (name, display_name, description, is_system_role)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.display_name.as_str())
        .bind(input.description.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to create role"))?;

        for permission in &input.permissions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, permissions.id
                FROM permissions
                WHERE permissions.name = $2
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to persist role grants"))?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit transaction"))?;

        Ok(RoleDefinition {
            role_id: RoleId::from_uuid(role_id),
            name: input.name,
            display_name: input.display_name,
            description: input.description,
            is_system_role: false,
            permissions: input.permissions,
        })
    }

    async fn update_role(
        &self,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        let updated = sqlx::query(
            r#"
            UPDATE roles
            SET display_name = $2, description = $3
            WHERE id = $1
                AND NOT is_system_role
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(input.display_name.as_str())
        .bind(input.description.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to update role"))?
        .rows_affected();

        if updated == 0 {
            let is_system_role = sqlx::query_scalar::<_, bool>(
                "SELECT is_system_role FROM roles WHERE id = $1",
            )
            .bind(role_id.as_uuid())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to load role"))?;

            return match is_system_role {
                Some(true) => Err(AppError::Conflict(format!(
                    "system role '{role_id}' cannot be edited"
                ))),
                _ => Err(AppError::NotFound(format!("role '{role_id}' was not found"))),
            };
        }

        // Replace-all: the stored grant set mirrors the input exactly,
        // stale entries cannot survive an edit.
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to clear role grants"))?;

        for permission in &input.permissions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, permissions.id
                FROM permissions
                WHERE permissions.name = $2
                "#,
            )
            .bind(role_id.as_uuid())
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to persist role grants"))?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit transaction"))?;

        self.find_role(role_id).await?.ok_or_else(|| {
            AppError::Internal(format!("role '{role_id}' vanished during update"))
        })
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_store_error(error, "failed to begin transaction"))?;

        let is_system_role = sqlx::query_scalar::<_, bool>(
            "SELECT is_system_role FROM roles WHERE id = $1 FOR UPDATE",
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to lock role row"))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if is_system_role {
            return Err(AppError::Conflict(format!(
                "system role '{role_id}' cannot be deleted"
            )));
        }

        let active = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_role_assignments
            WHERE role_id = $1
                AND is_active
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_store_error(error, "failed to count active assignments"))?;

        if active > 0 {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' still has {active} active assignment(s)"
            )));
        }

        // Historical inactive assignment rows survive as orphaned audit
        // records; role grants cascade away with the role.
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_store_error(error, "failed to delete role"))?;

        transaction
            .commit()
            .await
            .map_err(|error| map_store_error(error, "failed to commit transaction"))
    }

    async fn count_active_assignments(&self, role_id: RoleId) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_role_assignments
            WHERE role_id = $1
                AND is_active
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to count active assignments"))?;

        Ok(count.max(0) as u64)
    }

    async fn list_permissions(&self) -> AppResult<Vec<PermissionDescriptor>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT name, display_name, description
            FROM permissions
            ORDER BY category, display_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to list permissions"))?;

        Ok(rows
            .into_iter()
            .filter_map(PermissionRow::into_descriptor)
            .collect())
    }

    async fn update_permission_display(
        &self,
        permission: Permission,
        display_name: &str,
        description: &str,
    ) -> AppResult<PermissionDescriptor> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            UPDATE permissions
            SET display_name = $2, description = $3
            WHERE name = $1
            RETURNING name, display_name, description
            "#,
        )
        .bind(permission.as_str())
        .bind(display_name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_store_error(error, "failed to update permission display"))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "permission '{}' is missing from the catalog",
                permission.as_str()
            ))
        })?;

        row.into_descriptor().ok_or_else(|| {
            AppError::Internal(format!(
                "permission '{}' no longer decodes",
                permission.as_str()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use muster_application::{CreateRoleInput, RoleCatalogRepository, UpdateRoleInput};
    use muster_domain::{Permission, SUPER_ADMIN_ROLE_NAME};
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;

    use crate::catalog_seed::seed_security_catalog;

    use super::PostgresRoleCatalogRepository;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for role catalog tests: {error}");
        }

        if let Err(error) = seed_security_catalog(&pool).await {
            panic!("failed to seed catalog for role catalog tests: {error}");
        }

        Some(pool)
    }

    fn unique_name(prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
    }

    #[tokio::test]
    async fn seeding_is_idempotent_and_creates_super_admin() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let second_run = seed_security_catalog(&pool).await;
        assert!(second_run.is_ok());

        let repository = PostgresRoleCatalogRepository::new(pool);
        let roles = repository.list_roles().await.unwrap_or_default();
        let super_admin = roles.iter().find(|role| role.name == SUPER_ADMIN_ROLE_NAME);
        assert!(super_admin.is_some());
        let super_admin = super_admin.unwrap_or_else(|| panic!("test"));
        assert!(super_admin.is_system_role);
        assert_eq!(super_admin.permissions.len(), Permission::all().len());
    }

    #[tokio::test]
    async fn role_create_update_delete_roundtrip() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresRoleCatalogRepository::new(pool);
        let name = unique_name("events_team");

        let created = repository
            .create_role(CreateRoleInput {
                name: name.clone(),
                display_name: "Events Team".to_owned(),
                description: String::new(),
                permissions: vec![Permission::ManageEvents],
            })
            .await;
        assert!(created.is_ok());
        let created = created.unwrap_or_else(|_| panic!("test"));

        let updated = repository
            .update_role(
                created.role_id,
                UpdateRoleInput {
                    display_name: "Events Crew".to_owned(),
                    description: "Plans events.".to_owned(),
                    permissions: vec![Permission::ManageNews],
                },
            )
            .await;
        assert!(updated.is_ok());
        assert_eq!(
            updated.unwrap_or_else(|_| panic!("test")).permissions,
            vec![Permission::ManageNews]
        );

        let deleted = repository.delete_role(created.role_id).await;
        assert!(deleted.is_ok());

        let missing = repository.find_role(created.role_id).await;
        assert!(missing.unwrap_or(None).is_none());
    }

    #[tokio::test]
    async fn system_role_rejects_deletion() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresRoleCatalogRepository::new(pool);
        let roles = repository.list_roles().await.unwrap_or_default();
        let Some(super_admin) = roles.into_iter().find(|role| role.name == SUPER_ADMIN_ROLE_NAME)
        else {
            panic!("super_admin role missing after seeding");
        };

        let result = repository.delete_role(super_admin.role_id).await;
        assert!(matches!(result, Err(muster_core::AppError::Conflict(_))));
    }
}
