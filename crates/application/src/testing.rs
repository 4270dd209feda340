//! Shared in-memory security store for service tests.
//!
//! Implements every repository port over one mutex-guarded state so the
//! lifecycle tests exercise resolution end-to-end, the way the wired
//! application does against the real store.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use muster_core::{AdminUserId, AppError, AppResult, UserIdentity};
use muster_domain::{
    AccountState, Permission, RoleId, SUPER_ADMIN_ROLE_NAME,
};

use crate::admin_ports::{
    AdminDirectoryRepository, AdminIdentityRecord, NewAdminIdentity, RoleSummary,
};
use crate::audit::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository};
use crate::authorization_service::{AuthorizationRepository, AuthorizationService};
use crate::admin_lifecycle_service::AdminLifecycleService;
use crate::credential;
use crate::role_catalog_ports::{
    CreateRoleInput, PermissionDescriptor, RoleCatalogRepository, RoleDefinition, UpdateRoleInput,
};
use crate::role_catalog_service::RoleCatalogService;
use crate::token_auth::TokenAuthenticator;

const SEED_TIMESTAMP: &str = "2026-01-01T00:00:00Z";

#[derive(Clone)]
struct StoredAdmin {
    display_name: String,
    email: String,
    api_token_hash: String,
    state: AccountState,
}

#[derive(Clone)]
struct StoredRole {
    name: String,
    display_name: String,
    description: String,
    is_system_role: bool,
    permission_names: Vec<String>,
}

struct StoredAssignment {
    user_id: AdminUserId,
    role_id: RoleId,
    is_active: bool,
}

struct StoredGrant {
    user_id: AdminUserId,
    permission_name: String,
    is_active: bool,
}

#[derive(Default)]
struct StoreState {
    admins: HashMap<AdminUserId, StoredAdmin>,
    roles: HashMap<RoleId, StoredRole>,
    assignments: Vec<StoredAssignment>,
    grants: Vec<StoredGrant>,
    permission_display: HashMap<Permission, (String, String)>,
    audit_events: Vec<AuditEvent>,
}

/// In-memory implementation of all security repository ports.
#[derive(Default)]
pub(crate) struct InMemorySecurityStore {
    state: Mutex<StoreState>,
}

impl InMemorySecurityStore {
    pub(crate) async fn seed_role(
        &self,
        name: &str,
        display_name: &str,
        is_system_role: bool,
        permissions: Vec<Permission>,
    ) -> RoleId {
        let role_id = RoleId::new();
        self.state.lock().await.roles.insert(
            role_id,
            StoredRole {
                name: name.to_owned(),
                display_name: display_name.to_owned(),
                description: String::new(),
                is_system_role,
                permission_names: permissions
                    .iter()
                    .map(|permission| permission.as_str().to_owned())
                    .collect(),
            },
        );
        role_id
    }

    pub(crate) async fn seed_admin(
        &self,
        display_name: &str,
        email: &str,
        role_id: RoleId,
    ) -> AdminUserId {
        let user_id = AdminUserId::new();
        let mut state = self.state.lock().await;
        state.admins.insert(
            user_id,
            StoredAdmin {
                display_name: display_name.to_owned(),
                email: email.to_owned(),
                api_token_hash: credential::hash_api_token(email),
                state: AccountState::Active,
            },
        );
        state.assignments.push(StoredAssignment {
            user_id,
            role_id,
            is_active: true,
        });
        user_id
    }

    pub(crate) async fn grant_direct_permission(
        &self,
        user_id: AdminUserId,
        permission: Permission,
    ) {
        self.state.lock().await.grants.push(StoredGrant {
            user_id,
            permission_name: permission.as_str().to_owned(),
            is_active: true,
        });
    }

    pub(crate) async fn assign_role(&self, user_id: AdminUserId, role_id: RoleId) {
        self.state.lock().await.assignments.push(StoredAssignment {
            user_id,
            role_id,
            is_active: true,
        });
    }

    pub(crate) async fn admin_count(&self) -> usize {
        self.state.lock().await.admins.len()
    }

    pub(crate) async fn audit_count(&self) -> usize {
        self.state.lock().await.audit_events.len()
    }

    fn materialize_role(role_id: RoleId, role: &StoredRole) -> RoleDefinition {
        RoleDefinition {
            role_id,
            name: role.name.clone(),
            display_name: role.display_name.clone(),
            description: role.description.clone(),
            is_system_role: role.is_system_role,
            permissions: role
                .permission_names
                .iter()
                .filter_map(|name| Permission::from_str(name).ok())
                .collect(),
        }
    }

    fn materialize_admin(user_id: AdminUserId, admin: &StoredAdmin) -> AdminIdentityRecord {
        AdminIdentityRecord {
            user_id,
            display_name: admin.display_name.clone(),
            email: admin.email.clone(),
            state: admin.state,
            created_at: SEED_TIMESTAMP.to_owned(),
        }
    }
}

#[async_trait]
impl AuthorizationRepository for InMemorySecurityStore {
    async fn list_role_permission_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        let mut names = Vec::new();
        for assignment in &state.assignments {
            if assignment.user_id != user_id || !assignment.is_active {
                continue;
            }
            if let Some(role) = state.roles.get(&assignment.role_id) {
                names.extend(role.permission_names.iter().cloned());
            }
        }
        Ok(names)
    }

    async fn list_direct_grant_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .grants
            .iter()
            .filter(|grant| grant.user_id == user_id && grant.is_active)
            .map(|grant| grant.permission_name.clone())
            .collect())
    }

    async fn list_active_role_names(&self, user_id: AdminUserId) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_active)
            .filter_map(|assignment| {
                state
                    .roles
                    .get(&assignment.role_id)
                    .map(|role| role.name.clone())
            })
            .collect())
    }
}

#[async_trait]
impl AdminDirectoryRepository for InMemorySecurityStore {
    async fn create_admin(
        &self,
        identity: NewAdminIdentity,
        role_ids: &[RoleId],
        permissions: &[Permission],
        _assigned_by: AdminUserId,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state
            .admins
            .values()
            .any(|admin| admin.email == identity.email)
        {
            return Err(AppError::Conflict(format!(
                "administrator email '{}' already exists",
                identity.email
            )));
        }

        state.admins.insert(
            identity.user_id,
            StoredAdmin {
                display_name: identity.display_name,
                email: identity.email,
                api_token_hash: identity.api_token_hash,
                state: AccountState::Active,
            },
        );
        for role_id in role_ids {
            state.assignments.push(StoredAssignment {
                user_id: identity.user_id,
                role_id: *role_id,
                is_active: true,
            });
        }
        for permission in permissions {
            state.grants.push(StoredGrant {
                user_id: identity.user_id,
                permission_name: permission.as_str().to_owned(),
                is_active: true,
            });
        }
        Ok(())
    }

    async fn find_admin(&self, user_id: AdminUserId) -> AppResult<Option<AdminIdentityRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .admins
            .get(&user_id)
            .map(|admin| Self::materialize_admin(user_id, admin)))
    }

    async fn find_admin_by_token_hash(
        &self,
        api_token_hash: &str,
    ) -> AppResult<Option<AdminIdentityRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .admins
            .iter()
            .find(|(_, admin)| admin.api_token_hash == api_token_hash)
            .map(|(user_id, admin)| Self::materialize_admin(*user_id, admin)))
    }

    async fn list_admins(&self) -> AppResult<Vec<AdminIdentityRecord>> {
        let state = self.state.lock().await;
        let mut admins: Vec<AdminIdentityRecord> = state
            .admins
            .iter()
            .map(|(user_id, admin)| Self::materialize_admin(*user_id, admin))
            .collect();
        admins.sort_by(|left, right| left.display_name.cmp(&right.display_name));
        Ok(admins)
    }

    async fn list_active_roles(&self, user_id: AdminUserId) -> AppResult<Vec<RoleSummary>> {
        let state = self.state.lock().await;
        let mut roles: Vec<RoleSummary> = state
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_active)
            .filter_map(|assignment| {
                state.roles.get(&assignment.role_id).map(|role| RoleSummary {
                    role_id: assignment.role_id,
                    name: role.name.clone(),
                    display_name: role.display_name.clone(),
                })
            })
            .collect();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn replace_admin_roles(
        &self,
        user_id: AdminUserId,
        new_role_ids: &[RoleId],
        _assigned_by: AdminUserId,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.admins.contains_key(&user_id) {
            return Err(AppError::NotFound(format!(
                "administrator '{user_id}' was not found"
            )));
        }

        for assignment in &mut state.assignments {
            if assignment.user_id == user_id
                && assignment.is_active
                && !new_role_ids.contains(&assignment.role_id)
            {
                assignment.is_active = false;
            }
        }
        for role_id in new_role_ids {
            let already_active = state.assignments.iter().any(|assignment| {
                assignment.user_id == user_id
                    && assignment.role_id == *role_id
                    && assignment.is_active
            });
            if !already_active {
                state.assignments.push(StoredAssignment {
                    user_id,
                    role_id: *role_id,
                    is_active: true,
                });
            }
        }
        Ok(())
    }

    async fn deactivate_admin(&self, user_id: AdminUserId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let Some(admin) = state.admins.get_mut(&user_id) else {
            return Err(AppError::NotFound(format!(
                "administrator '{user_id}' was not found"
            )));
        };
        admin.state = AccountState::Deactivated;

        for assignment in &mut state.assignments {
            if assignment.user_id == user_id {
                assignment.is_active = false;
            }
        }
        for grant in &mut state.grants {
            if grant.user_id == user_id {
                grant.is_active = false;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RoleCatalogRepository for InMemorySecurityStore {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let state = self.state.lock().await;
        let mut roles: Vec<RoleDefinition> = state
            .roles
            .iter()
            .map(|(role_id, role)| Self::materialize_role(*role_id, role))
            .collect();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleDefinition>> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .get(&role_id)
            .map(|role| Self::materialize_role(role_id, role)))
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut state = self.state.lock().await;
        if state.roles.values().any(|role| role.name == input.name) {
            return Err(AppError::Conflict(format!(
                "role name '{}' already exists",
                input.name
            )));
        }

        let role_id = RoleId::new();
        let role = StoredRole {
            name: input.name,
            display_name: input.display_name,
            description: input.description,
            is_system_role: false,
            permission_names: input
                .permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        };
        let definition = Self::materialize_role(role_id, &role);
        state.roles.insert(role_id, role);
        Ok(definition)
    }

    async fn update_role(
        &self,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.lock().await;
        let Some(role) = state.roles.get_mut(&role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };
        if role.is_system_role {
            return Err(AppError::Conflict(format!(
                "system role '{}' cannot be edited",
                role.name
            )));
        }

        role.display_name = input.display_name;
        role.description = input.description;
        role.permission_names = input
            .permissions
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect();
        Ok(Self::materialize_role(role_id, role))
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let Some(role) = state.roles.get(&role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };
        if role.is_system_role {
            return Err(AppError::Conflict(format!(
                "system role '{}' cannot be deleted",
                role.name
            )));
        }
        let active = state
            .assignments
            .iter()
            .filter(|assignment| assignment.role_id == role_id && assignment.is_active)
            .count();
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' still has {active} active assignment(s)",
                role.name
            )));
        }

        state.roles.remove(&role_id);
        Ok(())
    }

    async fn count_active_assignments(&self, role_id: RoleId) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| assignment.role_id == role_id && assignment.is_active)
            .count() as u64)
    }

    async fn list_permissions(&self) -> AppResult<Vec<PermissionDescriptor>> {
        let state = self.state.lock().await;
        let mut descriptors: Vec<PermissionDescriptor> = Permission::all()
            .iter()
            .map(|permission| {
                let (display_name, description) = state
                    .permission_display
                    .get(permission)
                    .cloned()
                    .unwrap_or_else(|| {
                        (
                            permission.default_display_name().to_owned(),
                            permission.default_description().to_owned(),
                        )
                    });
                PermissionDescriptor {
                    permission: *permission,
                    display_name,
                    description,
                    category: permission.category(),
                }
            })
            .collect();
        descriptors.sort_by(|left, right| {
            (left.category, left.display_name.clone())
                .cmp(&(right.category, right.display_name.clone()))
        });
        Ok(descriptors)
    }

    async fn update_permission_display(
        &self,
        permission: Permission,
        display_name: &str,
        description: &str,
    ) -> AppResult<PermissionDescriptor> {
        let mut state = self.state.lock().await;
        state
            .permission_display
            .insert(permission, (display_name.to_owned(), description.to_owned()));
        Ok(PermissionDescriptor {
            permission,
            display_name: display_name.to_owned(),
            description: description.to_owned(),
            category: permission.category(),
        })
    }
}

#[async_trait]
impl AuditRepository for InMemorySecurityStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.state.lock().await.audit_events.push(event);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemorySecurityStore {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .audit_events
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, event)| {
                query
                    .action
                    .as_deref()
                    .is_none_or(|action| event.action.as_str() == action)
                    && query
                        .subject
                        .as_deref()
                        .is_none_or(|subject| event.subject == subject)
            })
            .skip(query.offset)
            .take(query.limit)
            .map(|(index, event)| AuditLogEntry {
                event_id: index.to_string(),
                subject: event.subject.clone(),
                action: event.action.as_str().to_owned(),
                resource_type: event.resource_type.clone(),
                resource_id: event.resource_id.clone(),
                detail: event.detail.clone(),
                created_at: SEED_TIMESTAMP.to_owned(),
            })
            .collect())
    }
}

/// Seeded store plus service constructors shared by the service tests.
pub(crate) struct SecurityHarness {
    pub(crate) store: Arc<InMemorySecurityStore>,
    pub(crate) super_admin_role_id: RoleId,
    pub(crate) editor_role_id: RoleId,
    root_user_id: AdminUserId,
}

impl SecurityHarness {
    pub(crate) async fn new() -> Self {
        let store = Arc::new(InMemorySecurityStore::default());
        let super_admin_role_id = store
            .seed_role(
                SUPER_ADMIN_ROLE_NAME,
                "Super Administrator",
                true,
                Permission::all().to_vec(),
            )
            .await;
        let editor_role_id = store
            .seed_role("news_editor", "News Editor", false, vec![Permission::ManageNews])
            .await;
        let root_user_id = store
            .seed_admin("Root", "root@example.org", super_admin_role_id)
            .await;

        Self {
            store,
            super_admin_role_id,
            editor_role_id,
            root_user_id,
        }
    }

    pub(crate) fn root_actor(&self) -> UserIdentity {
        UserIdentity::new(self.root_user_id, "Root", None)
    }

    pub(crate) fn authorization_service(&self) -> AuthorizationService {
        AuthorizationService::new(self.store.clone())
    }

    pub(crate) fn lifecycle_service(&self) -> AdminLifecycleService {
        AdminLifecycleService::new(
            self.authorization_service(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
        )
    }

    pub(crate) fn catalog_service(&self) -> RoleCatalogService {
        RoleCatalogService::new(
            self.authorization_service(),
            self.store.clone(),
            self.store.clone(),
        )
    }

    pub(crate) fn token_authenticator(&self) -> TokenAuthenticator {
        TokenAuthenticator::new(self.store.clone())
    }
}
