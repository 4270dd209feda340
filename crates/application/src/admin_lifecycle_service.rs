use std::collections::BTreeSet;
use std::sync::Arc;

use muster_core::{AdminUserId, AppError, AppResult, NonEmptyString, UserIdentity};
use muster_domain::{AccountState, AuditAction, EmailAddress, Permission, RoleId, sorted_for_display};

use crate::admin_ports::{
    AdminDirectoryRepository, AdminIdentityRecord, AdministrativeUser, CreateAdminInput,
    NewAdminIdentity,
};
use crate::audit::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository};
use crate::authorization_service::AuthorizationService;
use crate::credential;
use crate::role_catalog_ports::RoleCatalogRepository;

/// Result of administrative account creation.
///
/// The raw API token is surfaced exactly once; only its hash is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAdmin {
    /// The materialized account view.
    pub admin: AdministrativeUser,
    /// The account's bearer credential.
    pub api_token: String,
}

/// Application service orchestrating the administrative account lifecycle.
///
/// Accounts move through `{Active, Deactivated}`; deactivation is terminal.
/// Lifecycle mutations require the caller to hold the `super_admin` role so
/// ordinary role editing can never delegate administrator management.
#[derive(Clone)]
pub struct AdminLifecycleService {
    authorization_service: AuthorizationService,
    directory: Arc<dyn AdminDirectoryRepository>,
    catalog: Arc<dyn RoleCatalogRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl AdminLifecycleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        directory: Arc<dyn AdminDirectoryRepository>,
        catalog: Arc<dyn RoleCatalogRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            authorization_service,
            directory,
            catalog,
            audit_repository,
            audit_log_repository,
        }
    }

    /// Creates an administrative account with its initial roles and grants.
    ///
    /// Validation happens before any write: the identity fields must be
    /// well-formed and the account must start with at least one role or
    /// direct permission. Identity, assignments and grants are persisted as
    /// one atomic unit.
    pub async fn create_admin(
        &self,
        actor: &UserIdentity,
        input: CreateAdminInput,
    ) -> AppResult<CreatedAdmin> {
        self.authorization_service
            .require_super_admin(actor.user_id())
            .await?;

        let display_name = NonEmptyString::new(input.display_name)?;
        let email = EmailAddress::new(input.email)?;

        if input.role_ids.is_empty() && input.permissions.is_empty() {
            return Err(AppError::Validation(
                "an administrator must start with at least one role or direct permission"
                    .to_owned(),
            ));
        }

        let role_ids = dedup_role_ids(input.role_ids);
        for role_id in &role_ids {
            if self.catalog.find_role(*role_id).await?.is_none() {
                return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
            }
        }
        let permissions: Vec<Permission> = input
            .permissions
            .into_iter()
            .collect::<BTreeSet<Permission>>()
            .into_iter()
            .collect();

        let (api_token, api_token_hash) = credential::generate_api_token()?;
        let user_id = AdminUserId::new();

        self.directory
            .create_admin(
                NewAdminIdentity {
                    user_id,
                    display_name: display_name.into(),
                    email: email.into(),
                    api_token_hash,
                },
                &role_ids,
                &permissions,
                actor.user_id(),
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action: AuditAction::AdminCreated,
                resource_type: "admin_user".to_owned(),
                resource_id: user_id.to_string(),
                detail: Some(format!(
                    "created administrator with {} role(s) and {} direct grant(s)",
                    role_ids.len(),
                    permissions.len()
                )),
            })
            .await?;

        let admin = self.materialize_admin(user_id).await?;
        Ok(CreatedAdmin { admin, api_token })
    }

    /// Replaces an account's active role set wholesale.
    ///
    /// Direct grants are untouched: role replacement never implicitly
    /// revokes them. A transition that would leave a previously capable
    /// account with an empty effective permission set is rejected before
    /// any write.
    pub async fn update_admin_roles(
        &self,
        actor: &UserIdentity,
        user_id: AdminUserId,
        new_role_ids: Vec<RoleId>,
    ) -> AppResult<AdministrativeUser> {
        self.authorization_service
            .require_super_admin(actor.user_id())
            .await?;

        let record = self.require_admin(user_id).await?;
        if record.state != AccountState::Active {
            return Err(AppError::Conflict(format!(
                "cannot reassign roles of deactivated account '{user_id}'"
            )));
        }

        let new_role_ids = dedup_role_ids(new_role_ids);
        let mut proposed: BTreeSet<Permission> = BTreeSet::new();
        for role_id in &new_role_ids {
            let role = self
                .catalog
                .find_role(*role_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
            proposed.extend(role.permissions.iter().copied());
        }
        proposed.extend(
            self.authorization_service
                .resolve_direct_grants(user_id)
                .await?,
        );

        let current = self.authorization_service.resolve(user_id).await?;
        if !current.is_empty() && proposed.is_empty() {
            return Err(AppError::Validation(format!(
                "role update would leave '{user_id}' with no effective permissions"
            )));
        }

        self.directory
            .replace_admin_roles(user_id, &new_role_ids, actor.user_id())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action: AuditAction::AdminRolesUpdated,
                resource_type: "admin_user".to_owned(),
                resource_id: user_id.to_string(),
                detail: Some(format!(
                    "replaced role set with {} role(s)",
                    new_role_ids.len()
                )),
            })
            .await?;

        self.materialize_admin(user_id).await
    }

    /// Deactivates an administrative account.
    ///
    /// A caller may never deactivate their own account; the invariant is
    /// enforced here, not only in the calling surface, and applies to
    /// super-admins as well.
    pub async fn deactivate_admin(
        &self,
        actor: &UserIdentity,
        user_id: AdminUserId,
    ) -> AppResult<()> {
        if actor.user_id() == user_id {
            return Err(AppError::SelfDeactivation(format!(
                "caller '{user_id}' may not deactivate their own account"
            )));
        }

        self.authorization_service
            .require_super_admin(actor.user_id())
            .await?;

        let record = self.require_admin(user_id).await?;
        if record.state == AccountState::Deactivated {
            return Err(AppError::Conflict(format!(
                "account '{user_id}' is already deactivated"
            )));
        }

        self.directory.deactivate_admin(user_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action: AuditAction::AdminDeactivated,
                resource_type: "admin_user".to_owned(),
                resource_id: user_id.to_string(),
                detail: None,
            })
            .await
    }

    /// Returns the materialized view of one administrative account.
    pub async fn get_admin(
        &self,
        actor: &UserIdentity,
        user_id: AdminUserId,
    ) -> AppResult<AdministrativeUser> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageAdmins)
            .await?;

        self.materialize_admin(user_id).await
    }

    /// Lists all administrative identities.
    pub async fn list_admins(&self, actor: &UserIdentity) -> AppResult<Vec<AdminIdentityRecord>> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageAdmins)
            .await?;

        self.directory.list_admins().await
    }

    /// Returns recent audit entries.
    pub async fn list_audit_log(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ViewAuditLog)
            .await?;

        self.audit_log_repository.list_recent_entries(query).await
    }

    async fn require_admin(&self, user_id: AdminUserId) -> AppResult<AdminIdentityRecord> {
        self.directory
            .find_admin(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("administrator '{user_id}' was not found")))
    }

    async fn materialize_admin(&self, user_id: AdminUserId) -> AppResult<AdministrativeUser> {
        let record = self.require_admin(user_id).await?;
        let roles = self.directory.list_active_roles(user_id).await?;
        let permissions = self.authorization_service.resolve(user_id).await?;

        Ok(AdministrativeUser {
            user_id: record.user_id,
            display_name: record.display_name,
            email: record.email,
            state: record.state,
            created_at: record.created_at,
            roles,
            permissions: sorted_for_display(permissions),
        })
    }
}

fn dedup_role_ids(role_ids: Vec<RoleId>) -> Vec<RoleId> {
    let mut deduped: Vec<RoleId> = Vec::with_capacity(role_ids.len());
    for role_id in role_ids {
        if !deduped.contains(&role_id) {
            deduped.push(role_id);
        }
    }
    deduped
}
