//! Request and response payloads for the administrative API.

use serde::{Deserialize, Serialize};

use muster_application::{
    AdminIdentityRecord, AdministrativeUser, AuditLogEntry, CreatedAdmin, PermissionDescriptor,
    RoleDefinition, RoleSummary,
};

/// Incoming payload for administrative account creation.
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub role_ids: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload for replace-all role reassignment.
#[derive(Debug, Deserialize)]
pub struct UpdateAdminRolesRequest {
    pub role_ids: Vec<String>,
}

/// Incoming payload for a permission check.
#[derive(Debug, Deserialize)]
pub struct CheckPermissionRequest {
    pub user_id: String,
    pub permission: String,
}

/// Result of a permission check.
#[derive(Debug, Serialize)]
pub struct CheckPermissionResponse {
    pub user_id: String,
    pub permission: String,
    pub granted: bool,
}

/// API representation of a role attached to an account.
#[derive(Debug, Serialize)]
pub struct RoleSummaryResponse {
    pub role_id: String,
    pub name: String,
    pub display_name: String,
}

/// API representation of the materialized administrative account view.
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub state: String,
    pub created_at: String,
    pub roles: Vec<RoleSummaryResponse>,
    pub permissions: Vec<String>,
}

/// API representation of an administrative identity row.
#[derive(Debug, Serialize)]
pub struct AdminSummaryResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub state: String,
    pub created_at: String,
}

/// Creation result carrying the one-time API token.
#[derive(Debug, Serialize)]
pub struct CreatedAdminResponse {
    pub admin: AdminResponse,
    pub api_token: String,
}

/// Caller identity plus resolved capabilities.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub permissions: Vec<String>,
    pub is_super_admin: bool,
}

/// Resolved effective permission set of one account.
#[derive(Debug, Serialize)]
pub struct EffectivePermissionsResponse {
    pub user_id: String,
    pub permissions: Vec<String>,
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload for role updates.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// API representation of a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_system_role: bool,
    pub permissions: Vec<String>,
}

/// API representation of a permission catalog row.
#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub category: String,
}

/// Incoming payload for permission display updates.
#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub event_id: String,
    pub subject: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<String>,
    pub created_at: String,
}

/// Query parameters for audit log listing.
#[derive(Debug, Deserialize)]
pub struct AuditLogQueryParams {
    #[serde(default = "default_audit_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    pub action: Option<String>,
    pub subject: Option<String>,
}

fn default_audit_limit() -> usize {
    50
}

impl From<RoleSummary> for RoleSummaryResponse {
    fn from(value: RoleSummary) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            name: value.name,
            display_name: value.display_name,
        }
    }
}

impl From<AdministrativeUser> for AdminResponse {
    fn from(value: AdministrativeUser) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            display_name: value.display_name,
            email: value.email,
            state: value.state.as_str().to_owned(),
            created_at: value.created_at,
            roles: value.roles.into_iter().map(RoleSummaryResponse::from).collect(),
            permissions: value
                .permissions
                .into_iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

impl From<AdminIdentityRecord> for AdminSummaryResponse {
    fn from(value: AdminIdentityRecord) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            display_name: value.display_name,
            email: value.email,
            state: value.state.as_str().to_owned(),
            created_at: value.created_at,
        }
    }
}

impl From<CreatedAdmin> for CreatedAdminResponse {
    fn from(value: CreatedAdmin) -> Self {
        Self {
            admin: AdminResponse::from(value.admin),
            api_token: value.api_token,
        }
    }
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            name: value.name,
            display_name: value.display_name,
            description: value.description,
            is_system_role: value.is_system_role,
            permissions: value
                .permissions
                .into_iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

impl From<PermissionDescriptor> for PermissionResponse {
    fn from(value: PermissionDescriptor) -> Self {
        Self {
            name: value.permission.as_str().to_owned(),
            display_name: value.display_name,
            description: value.description,
            category: value.category.as_str().to_owned(),
        }
    }
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            subject: value.subject,
            action: value.action,
            resource_type: value.resource_type,
            resource_id: value.resource_id,
            detail: value.detail,
            created_at: value.created_at,
        }
    }
}
