use async_trait::async_trait;

use muster_core::AppResult;
use muster_domain::{Permission, PermissionCategory, RoleId};

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Human-readable role name.
    pub display_name: String,
    /// Free-form role description.
    pub description: String,
    /// Indicates a system-managed role that rejects edits and deletion.
    pub is_system_role: bool,
    /// Effective role grants.
    pub permissions: Vec<Permission>,
}

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: String,
    /// Human-readable role name.
    pub display_name: String,
    /// Free-form role description.
    pub description: String,
    /// Grants to attach to the role.
    pub permissions: Vec<Permission>,
}

/// Input payload for updating a role's display fields and permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// Human-readable role name.
    pub display_name: String,
    /// Free-form role description.
    pub description: String,
    /// Replacement permission set (replace-all semantics).
    pub permissions: Vec<Permission>,
}

/// Permission catalog row projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDescriptor {
    /// The catalogued permission.
    pub permission: Permission,
    /// Human-readable permission name.
    pub display_name: String,
    /// Free-form permission description.
    pub description: String,
    /// Category the permission is filed under.
    pub category: PermissionCategory,
}

/// Repository port for role and permission catalog administration.
#[async_trait]
pub trait RoleCatalogRepository: Send + Sync {
    /// Lists all roles with their effective grants.
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>>;

    /// Finds a role by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>>;

    /// Creates a non-system role and attaches grants.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition>;

    /// Updates a non-system role's display fields and replaces its
    /// permission set wholesale.
    async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput)
    -> AppResult<RoleDefinition>;

    /// Deletes a non-system role with no active assignments.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Counts active assignments referencing the role.
    async fn count_active_assignments(&self, role_id: RoleId) -> AppResult<u64>;

    /// Lists the permission catalog.
    async fn list_permissions(&self) -> AppResult<Vec<PermissionDescriptor>>;

    /// Updates a permission's display fields; name and category are
    /// immutable.
    async fn update_permission_display(
        &self,
        permission: Permission,
        display_name: &str,
        description: &str,
    ) -> AppResult<PermissionDescriptor>;
}
