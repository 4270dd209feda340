use std::sync::Arc;

use muster_application::{
    AdminLifecycleService, AuthorizationService, RoleCatalogService, TokenAuthenticator,
};
use muster_infrastructure::{
    PostgresAdminDirectoryRepository, PostgresAuditLogRepository, PostgresAuditRepository,
    PostgresAuthorizationRepository, PostgresRoleCatalogRepository,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub admin_lifecycle_service: AdminLifecycleService,
    pub role_catalog_service: RoleCatalogService,
    pub token_authenticator: TokenAuthenticator,
}

/// Wires repositories and services onto one connection pool.
pub fn build_app_state(pool: PgPool) -> AppState {
    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let directory = Arc::new(PostgresAdminDirectoryRepository::new(pool.clone()));
    let catalog = Arc::new(PostgresRoleCatalogRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let audit_log_repository = Arc::new(PostgresAuditLogRepository::new(pool));

    let authorization_service = AuthorizationService::new(authorization_repository);
    let admin_lifecycle_service = AdminLifecycleService::new(
        authorization_service.clone(),
        directory.clone(),
        catalog.clone(),
        audit_repository.clone(),
        audit_log_repository,
    );
    let role_catalog_service =
        RoleCatalogService::new(authorization_service.clone(), catalog, audit_repository);
    let token_authenticator = TokenAuthenticator::new(directory);

    AppState {
        authorization_service,
        admin_lifecycle_service,
        role_catalog_service,
        token_authenticator,
    }
}
