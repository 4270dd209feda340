//! PostgreSQL-backed repositories for the Muster authorization engine.

#![forbid(unsafe_code)]

mod catalog_seed;
mod postgres_admin_directory_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_role_catalog_repository;

pub use catalog_seed::seed_security_catalog;
pub use postgres_admin_directory_repository::PostgresAdminDirectoryRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_role_catalog_repository::PostgresRoleCatalogRepository;

use muster_core::AppError;

/// Maps a storage error to the shared taxonomy, surfacing unique-key
/// violations as conflicts and everything else as an unavailable store.
fn map_store_error(error: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        if database_error.is_unique_violation() {
            return AppError::Conflict(format!("{context}: value already exists"));
        }
    }

    AppError::Unavailable(format!("{context}: {error}"))
}
