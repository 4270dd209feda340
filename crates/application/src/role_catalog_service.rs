use std::collections::BTreeSet;
use std::sync::Arc;

use muster_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use muster_domain::{AuditAction, Permission, RoleId, normalize_role_name};

use crate::audit::{AuditEvent, AuditRepository};
use crate::authorization_service::AuthorizationService;
use crate::role_catalog_ports::{
    CreateRoleInput, PermissionDescriptor, RoleCatalogRepository, RoleDefinition, UpdateRoleInput,
};

/// Application service for role and permission catalog administration.
///
/// Permissions themselves are seeded, not created here; only their display
/// fields are editable. System roles reject every mutation path.
#[derive(Clone)]
pub struct RoleCatalogService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn RoleCatalogRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleCatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn RoleCatalogRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
        }
    }

    /// Returns all roles with their effective grants.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<RoleDefinition>> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRoles)
            .await?;

        self.repository.list_roles().await
    }

    /// Returns one role by id.
    pub async fn get_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
    ) -> AppResult<RoleDefinition> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRoles)
            .await?;

        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Creates a custom role and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRoles)
            .await?;

        let name = normalize_role_name(input.name.as_str())?;
        let display_name = NonEmptyString::new(input.display_name)?;
        let permissions = dedup_permissions(input.permissions);

        let role = self
            .repository
            .create_role(CreateRoleInput {
                name,
                display_name: display_name.into(),
                description: input.description,
                permissions,
            })
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action: AuditAction::RoleCreated,
                resource_type: "role".to_owned(),
                resource_id: role.name.clone(),
                detail: Some(format!(
                    "created role '{}' with {} permission(s)",
                    role.name,
                    role.permissions.len()
                )),
            })
            .await?;

        Ok(role)
    }

    /// Updates a role's display fields and replaces its permission set.
    ///
    /// The replacement is wholesale, never an incremental patch, so a stale
    /// entry cannot survive an edit.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRoles)
            .await?;

        let existing = self
            .repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        if existing.is_system_role {
            return Err(AppError::Conflict(format!(
                "system role '{}' cannot be edited",
                existing.name
            )));
        }

        let display_name = NonEmptyString::new(input.display_name)?;
        let permissions = dedup_permissions(input.permissions);

        let role = self
            .repository
            .update_role(
                role_id,
                UpdateRoleInput {
                    display_name: display_name.into(),
                    description: input.description,
                    permissions,
                },
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action: AuditAction::RoleUpdated,
                resource_type: "role".to_owned(),
                resource_id: role.name.clone(),
                detail: Some(format!(
                    "replaced permission set of role '{}' with {} permission(s)",
                    role.name,
                    role.permissions.len()
                )),
            })
            .await?;

        Ok(role)
    }

    /// Deletes a non-system role with no active assignments.
    ///
    /// Historical inactive assignment rows referencing the role survive as
    /// orphaned audit records; the resolver tolerates them.
    pub async fn delete_role(&self, actor: &UserIdentity, role_id: RoleId) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRoles)
            .await?;

        let existing = self
            .repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;
        if existing.is_system_role {
            return Err(AppError::Conflict(format!(
                "system role '{}' cannot be deleted",
                existing.name
            )));
        }

        let active = self.repository.count_active_assignments(role_id).await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' still has {active} active assignment(s)",
                existing.name
            )));
        }

        self.repository.delete_role(role_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action: AuditAction::RoleDeleted,
                resource_type: "role".to_owned(),
                resource_id: existing.name,
                detail: None,
            })
            .await
    }

    /// Returns the permission catalog.
    pub async fn list_permissions(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<PermissionDescriptor>> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRoles)
            .await?;

        self.repository.list_permissions().await
    }

    /// Updates a permission's display fields.
    pub async fn update_permission_display(
        &self,
        actor: &UserIdentity,
        permission: Permission,
        display_name: String,
        description: String,
    ) -> AppResult<PermissionDescriptor> {
        self.authorization_service
            .require_permission(actor.user_id(), Permission::ManageRoles)
            .await?;

        let display_name = NonEmptyString::new(display_name)?;
        let descriptor = self
            .repository
            .update_permission_display(permission, display_name.as_str(), description.as_str())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.user_id().to_string(),
                action: AuditAction::PermissionDisplayUpdated,
                resource_type: "permission".to_owned(),
                resource_id: permission.as_str().to_owned(),
                detail: None,
            })
            .await?;

        Ok(descriptor)
    }
}

fn dedup_permissions(permissions: Vec<Permission>) -> Vec<Permission> {
    permissions
        .into_iter()
        .collect::<BTreeSet<Permission>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use muster_core::{AdminUserId, AppError, UserIdentity};
    use muster_domain::Permission;

    use crate::role_catalog_ports::{CreateRoleInput, UpdateRoleInput};
    use crate::testing::SecurityHarness;

    fn role_input(name: &str) -> CreateRoleInput {
        CreateRoleInput {
            name: name.to_owned(),
            display_name: "Events Team".to_owned(),
            description: "Plans and publishes events.".to_owned(),
            permissions: vec![Permission::ManageEvents, Permission::ManageEvents],
        }
    }

    #[tokio::test]
    async fn create_role_requires_manage_roles_permission() {
        let harness = SecurityHarness::new().await;
        let outsider = UserIdentity::new(AdminUserId::new(), "outsider", None);

        let result = harness
            .catalog_service()
            .create_role(&outsider, role_input("events_team"))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn create_role_normalizes_name_and_dedups_permissions() {
        let harness = SecurityHarness::new().await;

        let role = harness
            .catalog_service()
            .create_role(&harness.root_actor(), role_input("  Events_Team "))
            .await;

        assert!(role.is_ok());
        let role = role.unwrap_or_else(|_| panic!("test"));
        assert_eq!(role.name, "events_team");
        assert_eq!(role.permissions, vec![Permission::ManageEvents]);
        assert!(!role.is_system_role);
    }

    #[tokio::test]
    async fn create_role_rejects_invalid_name() {
        let harness = SecurityHarness::new().await;

        let result = harness
            .catalog_service()
            .create_role(&harness.root_actor(), role_input("events team"))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_role_rejects_duplicate_name() {
        let harness = SecurityHarness::new().await;
        let service = harness.catalog_service();

        let first = service
            .create_role(&harness.root_actor(), role_input("events_team"))
            .await;
        assert!(first.is_ok());

        let second = service
            .create_role(&harness.root_actor(), role_input("events_team"))
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_role_replaces_permission_set_wholesale() {
        let harness = SecurityHarness::new().await;
        let service = harness.catalog_service();

        let role = service
            .create_role(&harness.root_actor(), role_input("events_team"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let updated = service
            .update_role(
                &harness.root_actor(),
                role.role_id,
                UpdateRoleInput {
                    display_name: "Events Team".to_owned(),
                    description: String::new(),
                    permissions: vec![Permission::ManageNews],
                },
            )
            .await;

        assert!(updated.is_ok());
        assert_eq!(
            updated.unwrap_or_else(|_| panic!("test")).permissions,
            vec![Permission::ManageNews]
        );
    }

    #[tokio::test]
    async fn system_role_rejects_update_and_delete() {
        let harness = SecurityHarness::new().await;
        let service = harness.catalog_service();

        let update = service
            .update_role(
                &harness.root_actor(),
                harness.super_admin_role_id,
                UpdateRoleInput {
                    display_name: "Renamed".to_owned(),
                    description: String::new(),
                    permissions: Vec::new(),
                },
            )
            .await;
        assert!(matches!(update, Err(AppError::Conflict(_))));

        let delete = service
            .delete_role(&harness.root_actor(), harness.super_admin_role_id)
            .await;
        assert!(matches!(delete, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn delete_role_rejects_active_assignments() {
        let harness = SecurityHarness::new().await;
        let service = harness.catalog_service();

        let role = service
            .create_role(&harness.root_actor(), role_input("events_team"))
            .await
            .unwrap_or_else(|_| panic!("test"));
        harness
            .store
            .assign_role(AdminUserId::new(), role.role_id)
            .await;

        let result = service.delete_role(&harness.root_actor(), role.role_id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn fresh_role_without_dependents_deletes() {
        let harness = SecurityHarness::new().await;
        let service = harness.catalog_service();

        let role = service
            .create_role(&harness.root_actor(), role_input("events_team"))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let result = service.delete_role(&harness.root_actor(), role.role_id).await;
        assert!(result.is_ok());

        let missing = service.get_role(&harness.root_actor(), role.role_id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn permission_display_update_is_applied() {
        let harness = SecurityHarness::new().await;
        let service = harness.catalog_service();

        let updated = service
            .update_permission_display(
                &harness.root_actor(),
                Permission::ManageNews,
                "Publish news".to_owned(),
                "Write, edit and publish portal news.".to_owned(),
            )
            .await;

        assert!(updated.is_ok());
        let descriptors = service
            .list_permissions(&harness.root_actor())
            .await
            .unwrap_or_default();
        let news = descriptors
            .iter()
            .find(|descriptor| descriptor.permission == Permission::ManageNews);
        assert_eq!(
            news.map(|descriptor| descriptor.display_name.as_str()),
            Some("Publish news")
        );
    }

    #[tokio::test]
    async fn permission_display_update_rejects_empty_name() {
        let harness = SecurityHarness::new().await;

        let result = harness
            .catalog_service()
            .update_permission_display(
                &harness.root_actor(),
                Permission::ManageNews,
                "   ".to_owned(),
                String::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
