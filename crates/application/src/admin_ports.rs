use async_trait::async_trait;

use muster_core::{AdminUserId, AppResult};
use muster_domain::{AccountState, Permission, RoleId};

/// Stored identity projection of an administrative account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentityRecord {
    /// Stable account identifier.
    pub user_id: AdminUserId,
    /// Human-readable account name.
    pub display_name: String,
    /// Validated account email.
    pub email: String,
    /// Lifecycle state.
    pub state: AccountState,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

/// Identity payload persisted when an administrative account is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminIdentity {
    /// Stable account identifier.
    pub user_id: AdminUserId,
    /// Human-readable account name.
    pub display_name: String,
    /// Validated account email.
    pub email: String,
    /// SHA-256 hash of the account's bearer credential.
    pub api_token_hash: String,
}

/// Active role projection attached to the materialized admin view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSummary {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Human-readable role name.
    pub display_name: String,
}

/// Materialized administrative account view: identity joined with active
/// roles and the resolved effective permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdministrativeUser {
    /// Stable account identifier.
    pub user_id: AdminUserId,
    /// Human-readable account name.
    pub display_name: String,
    /// Validated account email.
    pub email: String,
    /// Lifecycle state.
    pub state: AccountState,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
    /// Roles held through active assignments.
    pub roles: Vec<RoleSummary>,
    /// Effective permissions in display order.
    pub permissions: Vec<Permission>,
}

/// Input payload for administrative account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAdminInput {
    /// Human-readable account name.
    pub display_name: String,
    /// Account email.
    pub email: String,
    /// Initial role assignments.
    pub role_ids: Vec<RoleId>,
    /// Initial direct permission grants.
    pub permissions: Vec<Permission>,
}

/// Repository port for administrative identity and lifecycle writes.
///
/// Every mutation executes as a single atomic unit against the backing
/// store; a partial write must never leave a credential-bearing identity
/// with zero capabilities.
#[async_trait]
pub trait AdminDirectoryRepository: Send + Sync {
    /// Creates the identity plus its initial assignments and grants.
    async fn create_admin(
        &self,
        identity: NewAdminIdentity,
        role_ids: &[RoleId],
        permissions: &[Permission],
        assigned_by: AdminUserId,
    ) -> AppResult<()>;

    /// Finds an administrative identity by id.
    async fn find_admin(&self, user_id: AdminUserId) -> AppResult<Option<AdminIdentityRecord>>;

    /// Finds an administrative identity by its credential hash.
    async fn find_admin_by_token_hash(
        &self,
        api_token_hash: &str,
    ) -> AppResult<Option<AdminIdentityRecord>>;

    /// Lists all administrative identities.
    async fn list_admins(&self) -> AppResult<Vec<AdminIdentityRecord>>;

    /// Lists roles the user holds through active assignments.
    async fn list_active_roles(&self, user_id: AdminUserId) -> AppResult<Vec<RoleSummary>>;

    /// Replaces the user's active role set wholesale.
    ///
    /// Assignments not in `new_role_ids` are deactivated; ids not already
    /// active are newly assigned. Direct grants are untouched. Concurrent
    /// calls for the same user serialize at the storage layer; the last
    /// writer replaces the full set, no merge.
    async fn replace_admin_roles(
        &self,
        user_id: AdminUserId,
        new_role_ids: &[RoleId],
        assigned_by: AdminUserId,
    ) -> AppResult<()>;

    /// Deactivates the identity and every active assignment and grant.
    ///
    /// History is preserved: rows are soft-deactivated, never deleted.
    async fn deactivate_admin(&self, user_id: AdminUserId) -> AppResult<()>;
}
