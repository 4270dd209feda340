use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use muster_core::{AdminUserId, AppError, AppResult};
use muster_domain::{Permission, SUPER_ADMIN_ROLE_NAME};

/// Repository port for the permission resolution read paths.
///
/// Rows are surfaced as stored permission names; decoding happens in the
/// service so a dangling or unrecognized reference degrades one entry, never
/// the whole resolution.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists permission names reachable through the user's active role
    /// assignments.
    async fn list_role_permission_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>>;

    /// Lists permission names from the user's active direct grants.
    async fn list_direct_grant_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>>;

    /// Lists names of roles the user holds through active assignments.
    async fn list_active_role_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>>;
}

/// Application service resolving effective permissions for a user.
///
/// Read-only; safe to call concurrently from request handlers. Consulted on
/// effectively every privileged action.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Resolves the effective permission set for a user.
    ///
    /// The result is the de-duplicated union of role-derived permissions and
    /// direct grants. A user without any rows resolves to the empty set, not
    /// an error.
    pub async fn resolve(&self, user_id: AdminUserId) -> AppResult<BTreeSet<Permission>> {
        let role_names = self.repository.list_role_permission_names(user_id).await?;
        let grant_names = self.repository.list_direct_grant_names(user_id).await?;

        let mut permissions = decode_permission_names(user_id, role_names);
        permissions.extend(decode_permission_names(user_id, grant_names));
        Ok(permissions)
    }

    /// Resolves only the user's active direct grants.
    pub async fn resolve_direct_grants(
        &self,
        user_id: AdminUserId,
    ) -> AppResult<BTreeSet<Permission>> {
        let grant_names = self.repository.list_direct_grant_names(user_id).await?;
        Ok(decode_permission_names(user_id, grant_names))
    }

    /// Returns whether the user currently holds the permission.
    ///
    /// Fails closed: when the backing store is unavailable the check degrades
    /// to `false` instead of surfacing the outage to every gated action.
    pub async fn check_permission(
        &self,
        user_id: AdminUserId,
        permission: Permission,
    ) -> AppResult<bool> {
        match self.resolve(user_id).await {
            Ok(permissions) => Ok(permissions.contains(&permission)),
            Err(AppError::Unavailable(reason)) => {
                tracing::warn!(
                    user_id = %user_id,
                    permission = permission.as_str(),
                    reason = %reason,
                    "permission check degraded to deny: store unavailable"
                );
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    /// Ensures the user holds the required permission.
    pub async fn require_permission(
        &self,
        user_id: AdminUserId,
        permission: Permission,
    ) -> AppResult<()> {
        let permissions = self.resolve(user_id).await?;
        if permissions.contains(&permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{user_id}' is missing permission '{}'",
            permission.as_str()
        )))
    }

    /// Returns whether the user holds an active assignment to the
    /// `super_admin` role.
    pub async fn is_super_admin(&self, user_id: AdminUserId) -> AppResult<bool> {
        let role_names = self.repository.list_active_role_names(user_id).await?;
        Ok(role_names
            .iter()
            .any(|name| name == SUPER_ADMIN_ROLE_NAME))
    }

    /// Ensures the user is a super-admin.
    pub async fn require_super_admin(&self, user_id: AdminUserId) -> AppResult<()> {
        if self.is_super_admin(user_id).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{user_id}' does not hold the '{SUPER_ADMIN_ROLE_NAME}' role"
        )))
    }
}

/// Decodes stored permission names, skipping entries that no longer parse.
///
/// A dangling reference (permission deleted out of band, or an unrecognized
/// name) must not fail the whole resolution; a partial result is always
/// preferable to an authorization outage.
fn decode_permission_names(
    user_id: AdminUserId,
    names: Vec<String>,
) -> BTreeSet<Permission> {
    let mut permissions = BTreeSet::new();
    for name in names {
        match Permission::from_str(name.as_str()) {
            Ok(permission) => {
                permissions.insert(permission);
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %user_id,
                    permission = name.as_str(),
                    "skipping unrecognized permission during resolution"
                );
            }
        }
    }

    permissions
}
