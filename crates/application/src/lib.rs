//! Application services and ports for the Muster authorization engine.

#![forbid(unsafe_code)]

mod admin_lifecycle_service;
mod admin_ports;
mod audit;
mod authorization_service;
pub mod credential;
mod role_catalog_ports;
mod role_catalog_service;
#[cfg(test)]
mod testing;
mod token_auth;

pub use admin_lifecycle_service::{AdminLifecycleService, CreatedAdmin};
pub use admin_ports::{
    AdminDirectoryRepository, AdminIdentityRecord, AdministrativeUser, CreateAdminInput,
    NewAdminIdentity, RoleSummary,
};
pub use audit::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository};
pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use role_catalog_ports::{
    CreateRoleInput, PermissionDescriptor, RoleCatalogRepository, RoleDefinition, UpdateRoleInput,
};
pub use role_catalog_service::RoleCatalogService;
pub use token_auth::TokenAuthenticator;
